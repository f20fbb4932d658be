//! Integration tests for the synchronization engine
//!
//! Tests cover:
//! - Full download/verify/commit round-trips
//! - Security-policy gating of the manifest and artifact URLs
//! - Hash-mismatch abort with no partial commit
//! - TTL gating and unchanged-commit no-op detection
//! - Validator hot-reload after a commit
//! - HTTP response mocking using wiremock

mod common;

use clawsync_core::types::ArtifactSource;
use clawsync_core::utils::sha256_hex;
use common::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn full_sync_commits_verified_artifacts() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    let manifest = manifest_body(
        &server.uri(),
        "abc123",
        SCHEMA_BODY,
        UI_HINTS_BODY,
        VALIDATOR_BODY,
    );
    mount_text(&server, MANIFEST_PATH, &manifest, 1).await;
    mount_standard_artifacts(&server, 1).await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    let result = engine.initialize(6.0).await;

    assert!(result.checked);
    assert!(result.updated, "{}", result.message);
    assert_eq!(result.source, ArtifactSource::Cache);
    assert!(result.message.contains("abc123"));

    // Committed bytes read back identical to the fetched content.
    assert_eq!(engine.schema_text().await.unwrap(), SCHEMA_BODY);
    assert_eq!(engine.ui_hints_text().await.unwrap(), UI_HINTS_BODY);

    let status = engine.status().await;
    assert_eq!(status.source, ArtifactSource::Cache);
    assert_eq!(status.openclaw_commit.as_deref(), Some("abc123"));
    assert!(status.last_successful_sync_at.is_some());
    assert_eq!(status.last_error, None);
    assert!(status.policy.manifest.allowed);
}

#[tokio::test]
async fn blocked_host_keeps_bundled_root() {
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    // evil.example.com is not in the host allowlist.
    let options = clawsync_sync::EngineOptions::new(cache.path(), bundled.path())
        .with_manifest_url("https://evil.example.com/owner/repo/manifest.json")
        .with_policy(clawsync_core::types::SecurityPolicy::new(
            true,
            ["raw.githubusercontent.com"],
            ["*"],
        ));
    let mut engine = clawsync_sync::ArtifactSyncEngine::new(options).unwrap();

    let result = engine.initialize(6.0).await;
    assert!(result.checked);
    assert!(!result.updated);
    assert_eq!(result.source, ArtifactSource::Bundled);
    assert!(result.message.contains("blocked by security policy"));
    assert!(result.message.contains("evil.example.com"));

    let status = engine.status().await;
    assert!(status.last_error.is_some());
    assert!(!status.policy.manifest.allowed);
    // The bundled fallback keeps serving reads.
    assert_eq!(engine.schema_text().await.unwrap(), BUNDLED_SCHEMA);
}

#[tokio::test]
async fn hash_mismatch_aborts_whole_commit() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    // Declared uiHints digest does not match the served bytes.
    let manifest = manifest_body_with_digests(
        &server.uri(),
        "abc123",
        &sha256_hex(SCHEMA_BODY.as_bytes()),
        &"0".repeat(64),
        &sha256_hex(VALIDATOR_BODY.as_bytes()),
    );
    mount_text(&server, MANIFEST_PATH, &manifest, 1).await;
    mount_standard_artifacts(&server, 1).await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    let before = engine.active_source().await;
    let result = engine.initialize(6.0).await;

    assert!(!result.updated);
    assert_eq!(result.source, before);
    assert!(result.message.contains("Schema update rejected"));
    assert!(result.message.contains("SHA-256 mismatch"));

    // No artifact reached the live location.
    assert_eq!(engine.active_source().await, ArtifactSource::Bundled);
    assert_eq!(engine.schema_text().await.unwrap(), BUNDLED_SCHEMA);
}

#[tokio::test]
async fn ttl_gate_skips_network_on_second_call() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    let manifest = manifest_body(
        &server.uri(),
        "abc123",
        SCHEMA_BODY,
        UI_HINTS_BODY,
        VALIDATOR_BODY,
    );
    // Exactly one manifest fetch across both calls.
    mount_text(&server, MANIFEST_PATH, &manifest, 1).await;
    mount_standard_artifacts(&server, 1).await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    let first = engine.initialize(6.0).await;
    assert!(first.checked);
    assert!(first.updated);

    let second = engine.sync_if_needed(6.0, false).await;
    assert!(!second.checked);
    assert!(!second.updated);
    assert_eq!(second.source, ArtifactSource::Cache);
    assert!(second.message.contains("TTL"));

    server.verify().await;
}

#[tokio::test]
async fn unchanged_commit_is_a_noop() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    let manifest = manifest_body(
        &server.uri(),
        "abc123",
        SCHEMA_BODY,
        UI_HINTS_BODY,
        VALIDATOR_BODY,
    );
    // Forced second sync re-fetches the manifest but no artifacts.
    mount_text(&server, MANIFEST_PATH, &manifest, 2).await;
    mount_standard_artifacts(&server, 1).await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    assert!(engine.initialize(6.0).await.updated);

    let second = engine.sync_if_needed(6.0, true).await;
    assert!(second.checked);
    assert!(!second.updated);
    assert_eq!(second.source, ArtifactSource::Cache);
    assert!(second.message.contains("up to date"));

    server.verify().await;
}

#[tokio::test]
async fn artifact_policy_blocks_before_any_download() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    // Manifest host is trusted, artifact URLs are not.
    let manifest = manifest_body(
        "https://evil.example.com",
        "abc123",
        SCHEMA_BODY,
        UI_HINTS_BODY,
        VALIDATOR_BODY,
    );
    mount_text(&server, MANIFEST_PATH, &manifest, 1).await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    let result = engine.initialize(6.0).await;

    assert!(!result.updated);
    assert_eq!(result.source, ArtifactSource::Bundled);
    assert!(result.message.contains("blocked by artifact policy"));
}

#[tokio::test]
async fn transport_failure_preserves_prior_state() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    Mock::given(method("GET"))
        .and(path(MANIFEST_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    let result = engine.initialize(6.0).await;

    assert!(result.checked);
    assert!(!result.updated);
    assert_eq!(result.source, ArtifactSource::Bundled);
    assert!(result.message.contains("Schema sync failed"));

    let status = engine.status().await;
    assert!(status.last_error.is_some());
    assert_eq!(status.last_successful_sync_at, None);
}

#[tokio::test]
async fn structurally_invalid_manifest_is_rejected() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    mount_text(&server, MANIFEST_PATH, r#"{"version": 2}"#, 1).await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    let result = engine.initialize(6.0).await;

    assert!(!result.updated);
    assert_eq!(result.source, ArtifactSource::Bundled);
    assert!(result.message.contains("Schema sync failed"));
}

#[tokio::test]
async fn validator_reloads_after_new_commit() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    let strict = r#"{"type":"object","required":["gateway"]}"#;
    let lenient = r#"{"type":"object"}"#;

    // First commit ships the strict validator, second the lenient one.
    let first_manifest = manifest_body(&server.uri(), "commit-1", "{}", "{}", strict);
    let second_manifest = manifest_body(&server.uri(), "commit-2", "{}", "{}", lenient);
    Mock::given(method("GET"))
        .and(path(MANIFEST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(&first_manifest))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MANIFEST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(&second_manifest))
        .mount(&server)
        .await;
    mount_text(&server, "/openclaw/live/openclaw.schema.json", "{}", 2).await;
    mount_text(&server, "/openclaw/live/openclaw.ui-hints.json", "{}", 2).await;
    Mock::given(method("GET"))
        .and(path("/openclaw/live/openclaw.validator.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(strict))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/openclaw/live/openclaw.validator.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(lenient))
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    assert!(engine.initialize(6.0).await.updated);

    let issues = engine.validate_config(&serde_json::json!({})).await;
    assert_eq!(issues.len(), 1, "strict validator must flag the config");

    assert!(engine.sync_if_needed(6.0, true).await.updated);
    let issues = engine.validate_config(&serde_json::json!({})).await;
    assert!(issues.is_empty(), "lenient validator must accept the config");
}

#[tokio::test]
async fn unloadable_validator_surfaces_single_root_issue() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let bundled = tempfile::tempdir().unwrap();
    write_bundled_root(bundled.path()).await;

    // Hash verification covers arbitrary bytes; only the load step cares
    // that the validator artifact is interpretable.
    let manifest = manifest_body(
        &server.uri(),
        "abc123",
        SCHEMA_BODY,
        UI_HINTS_BODY,
        VALIDATOR_BODY,
    );
    mount_text(&server, MANIFEST_PATH, &manifest, 1).await;
    mount_standard_artifacts(&server, 1).await;

    let mut engine = engine_for(&server, cache.path(), bundled.path());
    assert!(engine.initialize(6.0).await.updated);

    let issues = engine.validate_config(&serde_json::json!({})).await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].path, "");
    assert!(issues[0].message.contains("could not be loaded"));
}
