//! # State Configuration
//!
//! Where the stores persist and how large the event channel is.
//!
//! ## Sources (Priority Order)
//! 1. Environment variables (`RIGSHARE_DATA_DIR`, `RIGSHARE_EVENT_CAPACITY`)
//! 2. Defaults (platform data directory, 256 events)

use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use tracing::info;

use crate::backend::{FileBackend, MemoryBackend, StateBackend};
use crate::error::StateResult;
use crate::events::DEFAULT_EVENT_CAPACITY;

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateConfig {
    /// Directory for the file backend. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,

    /// Capacity of the change-event channel.
    pub event_capacity: usize,
}

impl Default for StateConfig {
    /// Persists under the platform data directory, e.g.
    /// `~/.local/share/rigshare` on Linux. Falls back to memory when the
    /// platform has no home directory.
    fn default() -> Self {
        StateConfig {
            data_dir: ProjectDirs::from("com", "rigshare", "rigshare")
                .map(|dirs| dirs.data_dir().to_path_buf()),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl StateConfig {
    /// Ephemeral configuration for tests and previews.
    pub fn in_memory() -> Self {
        StateConfig {
            data_dir: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Defaults overridden by `RIGSHARE_*` environment variables.
    ///
    /// An unparsable capacity keeps the default.
    pub fn from_env() -> Self {
        let mut config = StateConfig::default();

        if let Ok(dir) = std::env::var("RIGSHARE_DATA_DIR") {
            config.data_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        if let Ok(raw) = std::env::var("RIGSHARE_EVENT_CAPACITY") {
            if let Ok(capacity) = raw.parse::<usize>() {
                config.event_capacity = capacity;
            }
        }

        config
    }

    /// Opens the backend this configuration describes.
    pub fn open_backend(&self) -> StateResult<Arc<dyn StateBackend>> {
        match &self.data_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file-backed store");
                Ok(Arc::new(FileBackend::open(dir)?))
            }
            None => {
                info!("Using in-memory store");
                Ok(Arc::new(MemoryBackend::new()))
            }
        }
    }
}
