//! Minimal persistent record store.
//!
//! JSON files under `<dir>/<kind>/<sanitized-id>.json`. The graph builder is
//! functionally correct without it; the arXiv client uses it only for
//! optional write-through caching of fetched records.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record saved under this (kind, id)
    #[error("no {kind} record for {id}")]
    NotFound { kind: String, id: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// File-backed store of JSON records keyed by (kind, id).
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory. Directories are created
    /// lazily on first save.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// The directory this store writes under.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Save a record, replacing any previous one for the same (kind, id).
    pub fn save<T: Serialize>(&self, kind: &str, id: &str, record: &T) -> Result<(), StoreError> {
        let path = self.record_path(kind, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(record)?;
        fs::write(&path, json)?;
        tracing::debug!(kind, id, path = %path.display(), "saved record");
        Ok(())
    }

    /// Load a record, or `StoreError::NotFound` when none was saved.
    pub fn load<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<T, StoreError> {
        let path = self.record_path(kind, id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    kind: kind.to_string(),
                    id: id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn record_path(&self, kind: &str, id: &str) -> PathBuf {
        self.base_dir
            .join(kind)
            .join(format!("{}.json", sanitize_filename(id)))
    }
}

/// Make an id safe to use as a filename (legacy ids contain slashes).
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
