//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default       |
//! |----------------------------|---------------|
//! | `RIGSHARE_PORT`            | `3001`        |
//! | `RIGSHARE_DATABASE_PATH`   | `rigshare.db` |
//! | `RIGSHARE_MAX_CONNECTIONS` | `5`           |
//! | `RIGSHARE_CORS_ANY`        | `true`        |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use rigshare_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Allow any origin (the web client runs on its own dev server)
    pub cors_any: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: 3001,
            database_path: PathBuf::from("rigshare.db"),
            max_connections: 5,
            cors_any: true,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            port: parse_or(&lookup, "RIGSHARE_PORT", defaults.port)?,

            database_path: lookup("RIGSHARE_DATABASE_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "RIGSHARE_MAX_CONNECTIONS", defaults.max_connections)?,

            cors_any: parse_or(&lookup, "RIGSHARE_CORS_ANY", defaults.cors_any)?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("RIGSHARE_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("RIGSHARE_PORT", "8080"),
            ("RIGSHARE_DATABASE_PATH", "/var/lib/rigshare/app.db"),
            ("RIGSHARE_MAX_CONNECTIONS", "12"),
            ("RIGSHARE_CORS_ANY", "false"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/rigshare/app.db"));
        assert_eq!(config.db_config().max_connections, 12);
        assert!(!config.cors_any);
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::from_lookup(lookup(&[("RIGSHARE_PORT", "http")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for RIGSHARE_PORT");

        assert!(ApiConfig::from_lookup(lookup(&[("RIGSHARE_MAX_CONNECTIONS", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("RIGSHARE_CORS_ANY", "maybe")])).is_err());
    }
}
