// ── Durable snapshot storage ──
//
// Each store writes one JSON document under its own key. The document is
// wrapped in a versioned envelope; anything that fails to parse or carries
// a different version is discarded on rehydrate.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;

/// Bumped whenever the envelope or a record shape changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Key-value backend for store snapshots.
///
/// Implementations are synchronous: writes are small and happen inside a
/// store mutation.
pub trait SnapshotStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ── Envelope ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EnvelopeRef<'a, D> {
    version: u32,
    saved_at: DateTime<Utc>,
    has_loaded_once: bool,
    last_loaded: Option<DateTime<Utc>>,
    data: &'a D,
}

#[derive(Deserialize)]
struct Envelope<D> {
    version: u32,
    #[allow(dead_code)]
    saved_at: DateTime<Utc>,
    #[serde(default)]
    has_loaded_once: bool,
    #[serde(default)]
    last_loaded: Option<DateTime<Utc>>,
    data: D,
}

/// What survives a restart: the data plus its fetch bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rehydrated<D> {
    pub data: D,
    pub has_loaded_once: bool,
    pub last_loaded: Option<DateTime<Utc>>,
}

pub(crate) fn encode<D: Serialize>(
    key: &str,
    data: &D,
    has_loaded_once: bool,
    last_loaded: Option<DateTime<Utc>>,
) -> Result<String, StorageError> {
    let envelope = EnvelopeRef {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        has_loaded_once,
        last_loaded,
        data,
    };
    serde_json::to_string(&envelope).map_err(|source| StorageError::Encode {
        key: key.to_owned(),
        source,
    })
}

/// Read and decode a snapshot. Unreadable, unparseable, or
/// wrong-version snapshots yield `None` after a warning.
pub(crate) fn rehydrate<D: DeserializeOwned>(
    storage: &dyn SnapshotStorage,
    key: &str,
) -> Option<Rehydrated<D>> {
    let raw = match storage.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "could not read persisted snapshot");
            return None;
        }
    };

    match serde_json::from_str::<Envelope<D>>(&raw) {
        Ok(env) if env.version == SNAPSHOT_VERSION => {
            debug!(key, "rehydrated snapshot");
            Some(Rehydrated {
                data: env.data,
                has_loaded_once: env.has_loaded_once,
                last_loaded: env.last_loaded,
            })
        }
        Ok(env) => {
            warn!(
                key,
                found = env.version,
                expected = SNAPSHOT_VERSION,
                "discarding snapshot with unknown version"
            );
            None
        }
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable snapshot");
            None
        }
    }
}

// ── File backend ─────────────────────────────────────────────────────

/// One `{key}.json` file per store under a directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create the backend, making `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_err(key: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_owned(),
        source,
    }
}

impl SnapshotStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(key)(e)),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).map_err(io_err(key))?;
        file.write_all(contents.as_bytes()).map_err(io_err(key))?;
        file.sync_all().map_err(io_err(key))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(io_err(key))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(io_err(key)(e)),
            _ => Ok(()),
        }
    }
}

// ── In-memory backend ────────────────────────────────────────────────

/// Process-local storage, for tests and short-lived consumers.
///
/// An optional byte quota makes writes fail the way a full storage
/// area would.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total stored bytes across all keys.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(quota),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(others);
            if contents.len() > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    needed: contents.len(),
                    available,
                });
            }
        }

        entries.insert(key.to_owned(), contents.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
