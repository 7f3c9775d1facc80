//! # Persistence Backends
//!
//! Every store persists through one [`StateBackend`]: a flat key/value space
//! where each value is a JSON array.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  key                    value                                           │
//! │  ───────────────────    ──────────────────────────────────             │
//! │  favorites              ["018e...", "018f..."]                          │
//! │  messages               [{ "id": ..., "senderId": ... }, ...]           │
//! │  rentalRequests         [{ "id": ..., "status": "pending" }, ...]       │
//! │  reviews                [...]                                           │
//! │  users                  [...]                                           │
//! │  listings:{ownerId}     one partition per owner                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two adapters ship: [`MemoryBackend`] for tests and ephemeral sessions, and
//! [`FileBackend`] which keeps one JSON file per key.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{StateError, StateResult};

// =============================================================================
// Keys
// =============================================================================

pub const FAVORITES_KEY: &str = "favorites";
pub const MESSAGES_KEY: &str = "messages";
pub const RENTALS_KEY: &str = "rentalRequests";
pub const REVIEWS_KEY: &str = "reviews";
pub const USERS_KEY: &str = "users";
pub const LISTINGS_PREFIX: &str = "listings:";

/// Partition key holding one owner's listings.
pub fn listings_key(owner_id: &str) -> String {
    format!("{LISTINGS_PREFIX}{owner_id}")
}

// =============================================================================
// Trait
// =============================================================================

/// Key/value storage for serialized collections.
///
/// Implementations must make `save` all-or-nothing for a single key.
pub trait StateBackend: Send + Sync {
    /// Raw value under `key`, `None` if never written.
    fn load(&self, key: &str) -> StateResult<Option<String>>;

    /// Replaces the value under `key`.
    fn save(&self, key: &str, value: &str) -> StateResult<()>;

    /// Deletes `key`. Missing keys are not an error.
    fn remove(&self, key: &str) -> StateResult<()>;

    /// Every stored key starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> StateResult<Vec<String>>;
}

/// Loads a JSON array, treating a missing key as empty.
pub fn load_collection<T: DeserializeOwned>(
    backend: &dyn StateBackend,
    key: &str,
) -> StateResult<Vec<T>> {
    match backend.load(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Serializes and saves a collection.
pub fn save_collection<T: Serialize>(
    backend: &dyn StateBackend,
    key: &str,
    items: &[T],
) -> StateResult<()> {
    let raw = serde_json::to_string(items)?;
    backend.save(key, &raw)?;
    trace!(key, count = items.len(), "Collection saved");
    Ok(())
}

// =============================================================================
// Memory Backend
// =============================================================================

/// In-process backend. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StateResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StateError::Backend("memory backend lock poisoned".to_string()))
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self, key: &str) -> StateResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StateResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StateResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StateResult<Vec<String>> {
        Ok(self
            .lock()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// =============================================================================
// File Backend
// =============================================================================

/// One `<encoded key>.json` file per key inside a directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens (creating if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> StateResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "File backend opened");
        Ok(FileBackend { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

impl StateBackend for FileBackend {
    fn load(&self, key: &str) -> StateResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> StateResult<()> {
        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StateResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> StateResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Some(key) = decode_key(stem) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Percent-encodes everything outside `[A-Za-z0-9_-]` so keys such as
/// `listings:{ownerId}` are safe file names on every platform.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
