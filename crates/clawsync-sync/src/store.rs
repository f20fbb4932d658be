//! Artifact store: cache layout, active-root resolution, atomic commit
//!
//! The live cache directory always holds either the previous complete
//! artifact set or the new complete set, never a mix. A commit writes all
//! four files into a fresh temporary directory, fsyncs them, and performs a
//! single rename over the live location.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use clawsync_core::constants::{
    MANIFEST_FILE_NAME, REQUIRED_ARTIFACT_FILES, SCHEMA_FILE_NAME, UI_HINTS_FILE_NAME,
    VALIDATOR_FILE_NAME,
};
use clawsync_core::error::Result;
use clawsync_core::types::{ActiveRoot, ArtifactSource, SchemaManifest};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::manifest::validate_manifest;

/// File name of the persisted sync state inside the cache root
pub const SYNC_STATE_FILE_NAME: &str = "sync-state.json";

/// Disambiguates temp directories created within the same nanosecond
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// On-disk artifact store with a live cache and a bundled fallback
#[derive(Debug)]
pub struct ArtifactStore {
    /// Cache root owned by the engine (holds `live/` and the state file)
    cache_root: PathBuf,

    /// Live directory serving cache reads
    live_root: PathBuf,

    /// Read-only fallback shipped with the host, assumed complete
    bundled_root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `cache_root` with `bundled_root` as fallback
    pub fn new(cache_root: impl Into<PathBuf>, bundled_root: impl Into<PathBuf>) -> Self {
        let cache_root = cache_root.into();
        let live_root = cache_root.join("live");
        Self {
            cache_root,
            live_root,
            bundled_root: bundled_root.into(),
        }
    }

    /// Create the cache directory layout if absent
    pub async fn ensure_layout(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.live_root).await?;
        Ok(())
    }

    /// Live cache directory
    pub fn live_root(&self) -> &Path {
        &self.live_root
    }

    /// Bundled fallback directory
    pub fn bundled_root(&self) -> &Path {
        &self.bundled_root
    }

    /// Path of the sync-state file
    pub fn sync_state_path(&self) -> PathBuf {
        self.cache_root.join(SYNC_STATE_FILE_NAME)
    }

    /// Whether `dir` holds all four required artifact files
    pub async fn has_complete_set(&self, dir: &Path) -> bool {
        for name in REQUIRED_ARTIFACT_FILES {
            if tokio::fs::metadata(dir.join(name)).await.is_err() {
                return false;
            }
        }
        true
    }

    /// Resolve the directory currently serving artifact reads
    ///
    /// Cache wins iff it holds a complete set; any subset is ignored in
    /// favor of the bundled root.
    pub async fn resolve_active_root(&self) -> ActiveRoot {
        if self.has_complete_set(&self.live_root).await {
            ActiveRoot {
                dir: self.live_root.clone(),
                source: ArtifactSource::Cache,
            }
        } else {
            ActiveRoot {
                dir: self.bundled_root.clone(),
                source: ArtifactSource::Bundled,
            }
        }
    }

    /// Read and validate the manifest committed in `dir`, if any
    pub async fn read_manifest(&self, dir: &Path) -> Option<SchemaManifest> {
        let raw = tokio::fs::read_to_string(dir.join(MANIFEST_FILE_NAME))
            .await
            .ok()?;
        let manifest: SchemaManifest = serde_json::from_str(&raw).ok()?;
        validate_manifest(&manifest).ok()?;
        Some(manifest)
    }

    /// Read the manifest of the live cache, if complete enough to have one
    pub async fn read_cache_manifest(&self) -> Option<SchemaManifest> {
        self.read_manifest(&self.live_root).await
    }

    /// Atomically replace the live cache with a freshly verified artifact set
    pub async fn commit(
        &self,
        manifest: &SchemaManifest,
        schema: &str,
        ui_hints: &str,
        validator: &str,
    ) -> Result<()> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let tmp_dir = self.cache_root.join(format!(
            "tmp-{}-{}",
            nanos,
            TMP_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));

        tokio::fs::create_dir_all(&tmp_dir).await?;
        write_durable(&tmp_dir.join(SCHEMA_FILE_NAME), schema.as_bytes()).await?;
        write_durable(&tmp_dir.join(UI_HINTS_FILE_NAME), ui_hints.as_bytes()).await?;
        write_durable(&tmp_dir.join(VALIDATOR_FILE_NAME), validator.as_bytes()).await?;
        let manifest_raw = serde_json::to_string_pretty(manifest)?;
        write_durable(&tmp_dir.join(MANIFEST_FILE_NAME), manifest_raw.as_bytes()).await?;

        // Single atomic replace of the live location.
        match tokio::fs::remove_dir_all(&self.live_root).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::rename(&tmp_dir, &self.live_root).await?;
        debug!("Committed artifact set {}", manifest.openclaw_commit);
        Ok(())
    }
}

/// Write bytes to a file and fsync before returning
pub(crate) async fn write_durable(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
