//! Shared helpers for engine integration tests
//!
//! Provides wiremock endpoint setup for manifest/artifact downloads plus
//! fixture directories for the bundled fallback root.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use clawsync_core::constants::{
    MANIFEST_FILE_NAME, SCHEMA_FILE_NAME, UI_HINTS_FILE_NAME, VALIDATOR_FILE_NAME,
};
use clawsync_core::types::SecurityPolicy;
use clawsync_core::utils::sha256_hex;
use clawsync_sync::{ArtifactSyncEngine, EngineOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Schema text inside the bundled fallback root
pub const BUNDLED_SCHEMA: &str = r#"{"title":"bundled schema"}"#;

/// Manifest path served by the mock upstream
pub const MANIFEST_PATH: &str = "/openclaw/live/manifest.json";

/// Artifact bytes used by most sync scenarios
pub const SCHEMA_BODY: &str = "{}";
pub const UI_HINTS_BODY: &str = "{}";
pub const VALIDATOR_BODY: &str = "export function validate(){return []}";

/// Policy trusting the local mock server over plain http
pub fn test_policy() -> SecurityPolicy {
    SecurityPolicy::new(false, ["127.0.0.1"], ["*"])
}

/// Build an engine pointed at the mock server's manifest endpoint
pub fn engine_for(server: &MockServer, cache_root: &Path, bundled_root: &Path) -> ArtifactSyncEngine {
    let options = EngineOptions::new(cache_root, bundled_root)
        .with_manifest_url(format!("{}{}", server.uri(), MANIFEST_PATH))
        .with_policy(test_policy())
        .with_fetch_timeout(Duration::from_secs(5));
    ArtifactSyncEngine::new(options).expect("engine construction")
}

/// Render a manifest document whose artifact digests match the given bodies
pub fn manifest_body(
    base: &str,
    commit: &str,
    schema: &str,
    ui_hints: &str,
    validator: &str,
) -> String {
    manifest_body_with_digests(
        base,
        commit,
        &sha256_hex(schema.as_bytes()),
        &sha256_hex(ui_hints.as_bytes()),
        &sha256_hex(validator.as_bytes()),
    )
}

/// Render a manifest with explicit digests (for mismatch scenarios)
pub fn manifest_body_with_digests(
    base: &str,
    commit: &str,
    schema_sha: &str,
    ui_hints_sha: &str,
    validator_sha: &str,
) -> String {
    serde_json::json!({
        "version": 1,
        "openclawCommit": commit,
        "generatedAt": "2026-01-01T00:00:00Z",
        "artifacts": {
            "schema": {
                "url": format!("{base}/openclaw/live/{SCHEMA_FILE_NAME}"),
                "sha256": schema_sha,
            },
            "uiHints": {
                "url": format!("{base}/openclaw/live/{UI_HINTS_FILE_NAME}"),
                "sha256": ui_hints_sha,
            },
            "validator": {
                "url": format!("{base}/openclaw/live/{VALIDATOR_FILE_NAME}"),
                "sha256": validator_sha,
            }
        }
    })
    .to_string()
}

/// Mount a GET endpoint returning `body`, asserting it is hit `expect` times
pub async fn mount_text(server: &MockServer, at: &str, body: &str, expect: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expect)
        .mount(server)
        .await;
}

/// Mount the three artifact endpoints for the standard bodies
pub async fn mount_standard_artifacts(server: &MockServer, expect: u64) {
    mount_text(
        server,
        &format!("/openclaw/live/{SCHEMA_FILE_NAME}"),
        SCHEMA_BODY,
        expect,
    )
    .await;
    mount_text(
        server,
        &format!("/openclaw/live/{UI_HINTS_FILE_NAME}"),
        UI_HINTS_BODY,
        expect,
    )
    .await;
    mount_text(
        server,
        &format!("/openclaw/live/{VALIDATOR_FILE_NAME}"),
        VALIDATOR_BODY,
        expect,
    )
    .await;
}

/// Populate a bundled fallback root with a complete artifact set
pub async fn write_bundled_root(dir: &Path) {
    tokio::fs::write(dir.join(SCHEMA_FILE_NAME), BUNDLED_SCHEMA)
        .await
        .unwrap();
    tokio::fs::write(dir.join(UI_HINTS_FILE_NAME), "{}")
        .await
        .unwrap();
    tokio::fs::write(dir.join(VALIDATOR_FILE_NAME), r#"{"type":"object"}"#)
        .await
        .unwrap();
    let manifest = manifest_body("https://example.org", "bundled0", "{}", "{}", "{}");
    tokio::fs::write(dir.join(MANIFEST_FILE_NAME), manifest)
        .await
        .unwrap();
}
