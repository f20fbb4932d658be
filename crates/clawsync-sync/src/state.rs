//! Persisted sync bookkeeping
//!
//! The state file is read-modify-written on every sync attempt, whatever the
//! outcome. A missing or corrupt file degrades to the default state rather
//! than failing the sync.

use std::path::{Path, PathBuf};

use clawsync_core::error::Result;
use clawsync_core::types::SyncState;
use tracing::warn;

use crate::store::write_durable;

/// Reader/writer for the engine's sync-state file
#[derive(Debug)]
pub struct SyncStateFile {
    path: PathBuf,
}

impl SyncStateFile {
    /// Create a handle for the state file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current state; missing or unreadable files yield the default
    pub async fn read(&self) -> SyncState {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(_) => return SyncState::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!("Discarding corrupt sync state file: {}", e);
                SyncState::default()
            }
        }
    }

    /// Persist the state as pretty-printed JSON
    pub async fn write(&self, state: &SyncState) -> Result<()> {
        let raw = serde_json::to_string_pretty(state)?;
        write_durable(&self.path, raw.as_bytes()).await
    }
}
