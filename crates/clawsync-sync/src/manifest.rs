//! Manifest parsing and structural validation
//!
//! Validation is all-or-nothing: a manifest with any malformed record is
//! rejected wholesale and the prior artifact set stays active.

use clawsync_core::error::{Error, Result};
use clawsync_core::types::{ArtifactRecord, SchemaManifest};

/// Supported manifest format version
pub const MANIFEST_VERSION: u32 = 1;

/// Parse manifest text and validate its structure
pub fn parse_manifest(raw: &str) -> Result<SchemaManifest> {
    let manifest: SchemaManifest = serde_json::from_str(raw)
        .map_err(|e| Error::invalid_manifest(format!("malformed document: {e}")))?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Validate an already-deserialized manifest
pub fn validate_manifest(manifest: &SchemaManifest) -> Result<()> {
    if manifest.version != MANIFEST_VERSION {
        return Err(Error::invalid_manifest(format!(
            "unsupported version {}",
            manifest.version
        )));
    }
    if manifest.openclaw_commit.trim().is_empty() {
        return Err(Error::invalid_manifest("missing openclawCommit"));
    }
    if manifest.generated_at.trim().is_empty() {
        return Err(Error::invalid_manifest("missing generatedAt"));
    }
    for (name, record) in [
        ("schema", &manifest.artifacts.schema),
        ("uiHints", &manifest.artifacts.ui_hints),
        ("validator", &manifest.artifacts.validator),
    ] {
        validate_record(name, record)?;
    }
    Ok(())
}

fn validate_record(name: &str, record: &ArtifactRecord) -> Result<()> {
    if record.url.trim().is_empty() {
        return Err(Error::invalid_manifest(format!(
            "artifact {name} has an empty URL"
        )));
    }
    if record.sha256.len() != 64 || !record.sha256.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::invalid_manifest(format!(
            "artifact {name} has an invalid sha256 digest"
        )));
    }
    Ok(())
}
