//! Synchronization engine state machine
//!
//! Owns the authoritative manifest for the three schema artifacts and
//! decides, per call, whether to consult upstream (TTL), what may be
//! trusted (security policy), and when a verified artifact set may be
//! committed. Failures never escape as errors: every attempt folds into a
//! `SyncResult` and leaves the last known-good artifact set active.
//!
//! The engine is not internally exclusive - callers must serialize
//! concurrent `sync_if_needed` invocations so two commits cannot race the
//! atomic directory replace.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use clawsync_core::constants::{
    DEFAULT_MANIFEST_URL, SCHEMA_FILE_NAME, UI_HINTS_FILE_NAME, VALIDATOR_FILE_NAME,
};
use clawsync_core::error::{Error, Result};
use clawsync_core::security::evaluate_url;
use clawsync_core::types::{
    ArtifactRecord, ArtifactSource, SchemaManifest, SchemaStatus, SecurityEvaluation,
    SecurityPolicy, StatusPolicy, SyncResult, SyncState, ValidationIssue,
};
use clawsync_core::utils::{clamp_ttl_hours, sha256_hex};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::manifest::parse_manifest;
use crate::state::SyncStateFile;
use crate::store::ArtifactStore;
use crate::validator::{load_validator, ValidatorCacheEntry, ValidatorLoad};

/// Bounded timeout for manifest and artifact fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Construction options for the synchronization engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Directory owned by the engine for the live cache and sync state
    pub cache_root: PathBuf,

    /// Read-only fallback artifact directory shipped with the host
    pub bundled_root: PathBuf,

    /// Manifest URL to check; empty falls back to the default
    pub manifest_url: String,

    /// Security policy gating every fetched URL
    pub policy: SecurityPolicy,

    /// Network timeout for each fetch
    pub fetch_timeout: Duration,
}

impl EngineOptions {
    /// Create options with the default manifest URL and security policy
    pub fn new(cache_root: impl Into<PathBuf>, bundled_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            bundled_root: bundled_root.into(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            policy: SecurityPolicy::default(),
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    /// Set the manifest URL
    pub fn with_manifest_url(mut self, manifest_url: impl Into<String>) -> Self {
        self.manifest_url = normalize_manifest_url(manifest_url.into());
        self
    }

    /// Set the security policy
    pub fn with_policy(mut self, policy: SecurityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the per-fetch network timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// Schema artifact synchronization engine
pub struct ArtifactSyncEngine {
    client: reqwest::Client,
    manifest_url: String,
    policy: SecurityPolicy,
    store: ArtifactStore,
    state_file: SyncStateFile,
    validator_cache: Option<ValidatorCacheEntry>,
}

impl ArtifactSyncEngine {
    /// Create a new engine
    pub fn new(options: EngineOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.fetch_timeout)
            .build()
            .map_err(|e| Error::transport(&options.manifest_url, e.to_string()))?;
        let store = ArtifactStore::new(&options.cache_root, &options.bundled_root);
        let state_file = SyncStateFile::new(store.sync_state_path());

        Ok(Self {
            client,
            manifest_url: normalize_manifest_url(options.manifest_url),
            policy: options.policy,
            store,
            state_file,
            validator_cache: None,
        })
    }

    /// Reconfigure the manifest URL and/or security policy
    ///
    /// Callers that cache a field catalog should invalidate it after this.
    pub fn configure_remote(
        &mut self,
        manifest_url: Option<String>,
        policy: Option<SecurityPolicy>,
    ) {
        if let Some(manifest_url) = manifest_url {
            self.manifest_url = normalize_manifest_url(manifest_url);
        }
        if let Some(policy) = policy {
            self.policy = policy;
        }
    }

    /// Configured manifest URL
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// Prepare the cache layout and run an initial TTL-gated sync
    pub async fn initialize(&mut self, ttl_hours: f64) -> SyncResult {
        if let Err(e) = self.store.ensure_layout().await {
            return SyncResult {
                checked: false,
                updated: false,
                source: ArtifactSource::Bundled,
                message: format!("Failed to prepare schema cache: {e}"),
            };
        }
        self.sync_if_needed(ttl_hours, false).await
    }

    /// Run one synchronization attempt
    ///
    /// Unless `force` is set, returns without touching the network while the
    /// previous check is still within `ttl_hours`. Every attempt updates
    /// `lastCheckedAt`; only a verified commit updates
    /// `lastSuccessfulSyncAt`; failures record `lastError` and leave the
    /// active root unchanged. The raw configured TTL is clamped to a sane
    /// range before use.
    pub async fn sync_if_needed(&mut self, ttl_hours: f64, force: bool) -> SyncResult {
        let ttl_hours = clamp_ttl_hours(ttl_hours);
        let state = self.state_file.read().await;

        if !force && self.within_ttl(&state, ttl_hours) {
            let active = self.store.resolve_active_root().await;
            return SyncResult {
                checked: false,
                updated: false,
                source: active.source,
                message: "Skipped schema sync because cache TTL has not expired.".to_string(),
            };
        }

        let manifest_evaluation = evaluate_url(&self.manifest_url, &self.policy);
        if !manifest_evaluation.allowed {
            let message = format!(
                "Schema sync blocked by security policy: {}",
                manifest_evaluation.reason
            );
            return self.fail(state, message).await;
        }

        debug!("Fetching schema manifest from {}", self.manifest_url);
        let remote = match self.fetch_manifest().await {
            Ok(remote) => remote,
            Err(e) => {
                return self.fail(state, format!("Schema sync failed: {e}")).await;
            }
        };

        if let Some(blocked) = self.first_blocked_artifact(&remote) {
            let message = format!("Schema sync blocked by artifact policy: {}", blocked.reason);
            return self.fail(state, message).await;
        }

        if let Some(current) = self.store.read_cache_manifest().await {
            if current.openclaw_commit == remote.openclaw_commit
                && self.store.has_complete_set(self.store.live_root()).await
            {
                self.succeed(state).await;
                return SyncResult {
                    checked: true,
                    updated: false,
                    source: ArtifactSource::Cache,
                    message: "Schema is already up to date.".to_string(),
                };
            }
        }

        match self.download_and_commit(&remote).await {
            Ok(()) => {
                self.validator_cache = None;
                self.succeed(state).await;
                info!("Updated schema artifacts to {}", remote.openclaw_commit);
                SyncResult {
                    checked: true,
                    updated: true,
                    source: ArtifactSource::Cache,
                    message: format!("Updated schema artifacts to {}.", remote.openclaw_commit),
                }
            }
            Err(e) => {
                self.fail(state, format!("Schema update rejected: {e}"))
                    .await
            }
        }
    }

    /// Schema artifact text from the active root
    pub async fn schema_text(&self) -> Result<String> {
        self.read_active(SCHEMA_FILE_NAME).await
    }

    /// UI hints artifact text from the active root
    pub async fn ui_hints_text(&self) -> Result<String> {
        self.read_active(UI_HINTS_FILE_NAME).await
    }

    /// Source tag of the directory currently serving reads
    pub async fn active_source(&self) -> ArtifactSource {
        self.store.resolve_active_root().await.source
    }

    /// Resolve the validator artifact from the active root
    pub async fn validator(&mut self) -> ValidatorLoad {
        let active = self.store.resolve_active_root().await;
        let path = active.dir.join(VALIDATOR_FILE_NAME);
        load_validator(&path, &mut self.validator_cache).await
    }

    /// Validate a raw configuration value against the active validator
    ///
    /// A missing validator yields no issues; a validator artifact that fails
    /// to load is surfaced as a single synthetic issue at the root path.
    pub async fn validate_config(&mut self, raw: &Value) -> Vec<ValidationIssue> {
        match self.validator().await {
            ValidatorLoad::Missing => Vec::new(),
            ValidatorLoad::Invalid(message) => vec![ValidationIssue {
                path: String::new(),
                message: format!("Configuration validator could not be loaded: {message}"),
            }],
            ValidatorLoad::Loaded(validator) => validator.validate(raw),
        }
    }

    /// Point-in-time status report for user display
    pub async fn status(&self) -> SchemaStatus {
        let state = self.state_file.read().await;
        let active = self.store.resolve_active_root().await;
        let active_manifest = self.store.read_manifest(&active.dir).await;

        let manifest_evaluation = evaluate_url(&self.manifest_url, &self.policy);
        let artifact_evaluations = active_manifest
            .as_ref()
            .map(|manifest| self.evaluate_artifact_urls(manifest))
            .unwrap_or_default();

        SchemaStatus {
            source: active.source,
            manifest_url: self.manifest_url.clone(),
            openclaw_commit: active_manifest
                .as_ref()
                .map(|m| m.openclaw_commit.clone()),
            generated_at: active_manifest.as_ref().map(|m| m.generated_at.clone()),
            last_checked_at: state.last_checked_at,
            last_successful_sync_at: state.last_successful_sync_at,
            last_error: state.last_error,
            policy: StatusPolicy {
                manifest: manifest_evaluation,
                artifacts: artifact_evaluations,
            },
        }
    }

    fn within_ttl(&self, state: &SyncState, ttl_hours: u32) -> bool {
        let Some(last_checked_at) = state.last_checked_at.as_deref() else {
            return false;
        };
        let Ok(last_checked) = DateTime::parse_from_rfc3339(last_checked_at) else {
            return false;
        };
        let ttl = chrono::Duration::hours(ttl_hours as i64);
        let elapsed = Utc::now().signed_duration_since(last_checked);
        elapsed >= chrono::Duration::zero() && elapsed < ttl
    }

    async fn fetch_manifest(&self) -> Result<SchemaManifest> {
        let raw = self.fetch_text(&self.manifest_url).await?;
        parse_manifest(&raw)
    }

    fn evaluate_artifact_urls(&self, manifest: &SchemaManifest) -> Vec<SecurityEvaluation> {
        manifest
            .records()
            .iter()
            .map(|record| evaluate_url(&record.url, &self.policy))
            .collect()
    }

    fn first_blocked_artifact(&self, manifest: &SchemaManifest) -> Option<SecurityEvaluation> {
        self.evaluate_artifact_urls(manifest)
            .into_iter()
            .find(|evaluation| !evaluation.allowed)
    }

    /// Download all three artifacts concurrently, verify every digest, and
    /// only then commit - a single mismatch discards the whole set
    async fn download_and_commit(&self, manifest: &SchemaManifest) -> Result<()> {
        let (schema, ui_hints, validator) = tokio::try_join!(
            self.fetch_verified(&manifest.artifacts.schema),
            self.fetch_verified(&manifest.artifacts.ui_hints),
            self.fetch_verified(&manifest.artifacts.validator),
        )?;
        self.store
            .commit(manifest, &schema, &ui_hints, &validator)
            .await
    }

    async fn fetch_verified(&self, record: &ArtifactRecord) -> Result<String> {
        let content = self.fetch_text(&record.url).await?;
        let actual = sha256_hex(content.as_bytes());
        if !actual.eq_ignore_ascii_case(&record.sha256) {
            warn!("Digest mismatch for {}", record.url);
            return Err(Error::hash_mismatch(&record.url));
        }
        Ok(content)
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| Error::transport(url, e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::fetch_failed(response.status().as_u16(), url));
        }
        response
            .text()
            .await
            .map_err(|e| Error::transport(url, e.to_string()))
    }

    async fn read_active(&self, file_name: &str) -> Result<String> {
        let active = self.store.resolve_active_root().await;
        Ok(tokio::fs::read_to_string(active.dir.join(file_name)).await?)
    }

    /// Record a failed attempt and report the unchanged active root
    async fn fail(&self, mut state: SyncState, message: String) -> SyncResult {
        warn!("{}", message);
        state.last_checked_at = Some(now_iso());
        state.last_error = Some(message.clone());
        self.persist_state(&state).await;
        let active = self.store.resolve_active_root().await;
        SyncResult {
            checked: true,
            updated: false,
            source: active.source,
            message,
        }
    }

    /// Record a successful attempt, clearing any previous error
    async fn succeed(&self, mut state: SyncState) {
        let now = now_iso();
        state.last_checked_at = Some(now.clone());
        state.last_successful_sync_at = Some(now);
        state.last_error = None;
        self.persist_state(&state).await;
    }

    async fn persist_state(&self, state: &SyncState) {
        if let Err(e) = self.state_file.write(state).await {
            warn!("Failed to persist sync state: {}", e);
        }
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn normalize_manifest_url(manifest_url: String) -> String {
    let trimmed = manifest_url.trim();
    if trimmed.is_empty() {
        DEFAULT_MANIFEST_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_url_falls_back_to_default() {
        assert_eq!(
            normalize_manifest_url("   ".to_string()),
            DEFAULT_MANIFEST_URL
        );
        assert_eq!(
            normalize_manifest_url(" https://x/y/z.json ".to_string()),
            "https://x/y/z.json"
        );
    }

    #[tokio::test]
    async fn ttl_gate_respects_recent_check() {
        let cache = tempfile::tempdir().unwrap();
        let bundled = tempfile::tempdir().unwrap();
        let engine =
            ArtifactSyncEngine::new(EngineOptions::new(cache.path(), bundled.path())).unwrap();

        let fresh = SyncState {
            last_checked_at: Some(now_iso()),
            ..Default::default()
        };
        assert!(engine.within_ttl(&fresh, 6));

        let stale = SyncState {
            last_checked_at: Some("2020-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        assert!(!engine.within_ttl(&stale, 6));

        let unparsable = SyncState {
            last_checked_at: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(!engine.within_ttl(&unparsable, 6));
    }
}
