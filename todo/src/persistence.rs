//! Durable storage for the todo list.
//!
//! The whole list is written as one JSON document after every mutation:
//!
//! ```json
//! { "revision": 3, "next_id": 4, "items": [ { "id": 1, "title": "Buy milk", ... } ] }
//! ```
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a crash mid-write leaves the previous document intact. `revision`
//! increases with every mutation; a save carrying a revision at or below
//! the last one written is skipped, so a slow write can never clobber a
//! newer one.

use crate::types::TodoItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// Persisted form of the todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoSnapshot {
    /// Mutation counter at the time of capture
    pub revision: u64,
    /// Id the next created todo will receive; `null` once ids ran out
    pub next_id: Option<u64>,
    /// Items in creation order
    pub items: Vec<TodoItem>,
}

/// Errors from reading or writing snapshots.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for snapshots written after each mutation.
///
/// Implementations must be `Send + Sync`: they are shared with the effects
/// spawned by the store.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the snapshot could not be written.
    async fn save(&self, snapshot: TodoSnapshot) -> Result<(), PersistenceError>;
}

/// Snapshot storage in a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    last_written: Mutex<u64>,
}

impl JsonFileStore {
    /// Use the file at `path`. Nothing is read or created until needed.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_written: Mutex::new(0),
        }
    }

    /// Location of the data file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot.
    ///
    /// A missing or blank file is an empty list and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the file cannot be read or does not
    /// hold a valid snapshot.
    pub fn load(&self) -> Result<Option<TodoSnapshot>, PersistenceError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let snapshot: TodoSnapshot = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            revision = snapshot.revision,
            items = snapshot.items.len(),
            "Loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn save(&self, snapshot: TodoSnapshot) -> Result<(), PersistenceError> {
        // Held across the write so saves land in revision order
        let mut last_written = self.last_written.lock().await;
        if snapshot.revision <= *last_written {
            tracing::debug!(
                revision = snapshot.revision,
                last_written = *last_written,
                "Skipping stale snapshot"
            );
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        *last_written = snapshot.revision;
        tracing::debug!(
            path = %self.path.display(),
            revision = snapshot.revision,
            "Snapshot written"
        );
        Ok(())
    }
}
