//! Data-driven configuration validation
//!
//! The validator artifact is a JSON Schema document, never executable code:
//! the host compiles it with the `jsonschema` crate and interprets it
//! directly. Loaded validators are cached keyed by (path, mtime) so repeated
//! validations do not recompile; the engine drops the cache whenever a
//! commit replaces the cache directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use clawsync_core::error::{Error, Result};
use clawsync_core::types::ValidationIssue;
use serde_json::Value;
use tracing::{debug, warn};

/// A compiled validator artifact
#[derive(Debug)]
pub struct CompiledValidator {
    validator: jsonschema::Validator,
}

impl CompiledValidator {
    /// Compile a validator artifact from its text
    pub fn from_schema_text(raw: &str) -> Result<Self> {
        let schema: Value = serde_json::from_str(raw)
            .map_err(|e| Error::invalid_manifest(format!("validator artifact is not JSON: {e}")))?;
        let validator = jsonschema::validator_for(&schema).map_err(|e| {
            Error::invalid_manifest(format!("validator artifact failed to compile: {e}"))
        })?;
        Ok(Self { validator })
    }

    /// Validate a raw configuration value
    ///
    /// Returns one issue per schema violation; an empty list means valid.
    pub fn validate(&self, raw: &Value) -> Vec<ValidationIssue> {
        self.validator
            .iter_errors(raw)
            .map(|e| ValidationIssue {
                path: dotted_instance_path(&e.instance_path().to_string()),
                message: e.to_string(),
            })
            .collect()
    }
}

/// Outcome of resolving the validator artifact from the active root
#[derive(Debug, Clone)]
pub enum ValidatorLoad {
    /// No validator artifact present
    Missing,
    /// An artifact is present but could not be parsed or compiled
    Invalid(String),
    /// Ready to validate
    Loaded(Arc<CompiledValidator>),
}

/// Mtime-keyed cache entry for a loaded validator
#[derive(Debug, Clone)]
pub(crate) struct ValidatorCacheEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub validator: Arc<CompiledValidator>,
}

/// Load the validator at `path`, reusing `cache` when (path, mtime) match
pub(crate) async fn load_validator(
    path: &Path,
    cache: &mut Option<ValidatorCacheEntry>,
) -> ValidatorLoad {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(_) => return ValidatorLoad::Missing,
    };
    let modified = match metadata.modified() {
        Ok(modified) => modified,
        Err(e) => return ValidatorLoad::Invalid(e.to_string()),
    };

    if let Some(entry) = cache {
        if entry.path == path && entry.modified == modified {
            return ValidatorLoad::Loaded(entry.validator.clone());
        }
    }

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => return ValidatorLoad::Invalid(e.to_string()),
    };
    match CompiledValidator::from_schema_text(&raw) {
        Ok(validator) => {
            debug!("Compiled validator artifact from {:?}", path);
            let validator = Arc::new(validator);
            *cache = Some(ValidatorCacheEntry {
                path: path.to_path_buf(),
                modified,
                validator: validator.clone(),
            });
            ValidatorLoad::Loaded(validator)
        }
        Err(e) => {
            warn!("Validator artifact rejected: {}", e);
            ValidatorLoad::Invalid(e.to_string())
        }
    }
}

/// Convert a JSON-pointer instance path ("/a/b/0") to dotted form ("a.b.0")
fn dotted_instance_path(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}
