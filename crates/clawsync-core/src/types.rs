//! Shared type definitions for manifests, sync state, and field catalogs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// One downloadable artifact named by the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Download URL
    pub url: String,

    /// Expected SHA-256 digest (64 lowercase hex characters)
    pub sha256: String,
}

/// The three artifacts governed by a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestArtifacts {
    /// JSON Schema for the configuration document
    pub schema: ArtifactRecord,

    /// Human-authored UI hint annotations
    pub ui_hints: ArtifactRecord,

    /// Validator document (a JSON Schema interpreted by the host)
    pub validator: ArtifactRecord,
}

/// Versioned descriptor naming the current artifact set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaManifest {
    /// Manifest format version (must be 1)
    pub version: u32,

    /// Opaque upstream version id
    pub openclaw_commit: String,

    /// ISO-8601 generation timestamp
    pub generated_at: String,

    /// Artifact records keyed by role
    pub artifacts: ManifestArtifacts,
}

impl SchemaManifest {
    /// Iterate the three artifact records in a fixed order
    pub fn records(&self) -> [&ArtifactRecord; 3] {
        [
            &self.artifacts.schema,
            &self.artifacts.ui_hints,
            &self.artifacts.validator,
        ]
    }
}

/// Policy governing which URLs the sync engine may trust
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    /// Reject any non-https URL
    pub require_https: bool,

    /// Lower-cased host allowlist
    pub allowed_hosts: BTreeSet<String>,

    /// Lower-cased `owner/repo` allowlist; the `*` sentinel allows any
    pub allowed_repositories: BTreeSet<String>,
}

impl SecurityPolicy {
    /// Create a policy, normalizing allowlist entries (trim, lowercase,
    /// drop empties)
    pub fn new<H, R>(require_https: bool, allowed_hosts: H, allowed_repositories: R) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        Self {
            require_https,
            allowed_hosts: normalize_list(allowed_hosts),
            allowed_repositories: normalize_list(allowed_repositories),
        }
    }

    /// Whether the repository allowlist contains the `*` sentinel
    pub fn allows_any_repository(&self) -> bool {
        self.allowed_repositories.contains("*")
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::new(
            true,
            crate::constants::DEFAULT_ALLOWED_HOSTS.iter().copied(),
            crate::constants::DEFAULT_ALLOWED_REPOSITORIES.iter().copied(),
        )
    }
}

fn normalize_list<I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Result of evaluating one URL against a security policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityEvaluation {
    /// Whether the URL may be used
    pub allowed: bool,

    /// Human-readable reason, structured for display
    pub reason: String,

    /// Host, when one could be parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Inferred `owner/repo` identifier, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

/// Which directory is currently serving artifact reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    /// The hash-verified download cache
    Cache,
    /// The read-only fallback shipped with the host
    Bundled,
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactSource::Cache => write!(f, "cache"),
            ArtifactSource::Bundled => write!(f, "bundled"),
        }
    }
}

/// The directory plus source tag currently serving artifact reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoot {
    /// Absolute directory path
    pub dir: PathBuf,

    /// Source tag for the directory
    pub source: ArtifactSource,
}

/// Outcome of one synchronization attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Whether upstream was actually consulted (false inside the TTL)
    pub checked: bool,

    /// Whether a new artifact set was committed
    pub updated: bool,

    /// Active root after the attempt
    pub source: ArtifactSource,

    /// Human-readable outcome message
    pub message: String,
}

/// Persisted sync bookkeeping, owned by the synchronization engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncState {
    /// RFC-3339 timestamp of the last attempt, success or not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<String>,

    /// RFC-3339 timestamp of the last verified commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_sync_at: Option<String>,

    /// Message from the most recent failure; cleared on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Policy evaluations reported as part of a status snapshot
#[derive(Debug, Clone, Serialize)]
pub struct StatusPolicy {
    /// Evaluation of the configured manifest URL
    pub manifest: SecurityEvaluation,

    /// Evaluations of the active manifest's artifact URLs
    pub artifacts: Vec<SecurityEvaluation>,
}

/// Point-in-time report of the sync engine's state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatus {
    /// Active root source
    pub source: ArtifactSource,

    /// Configured manifest URL
    pub manifest_url: String,

    /// Commit id of the active manifest, when one is readable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openclaw_commit: Option<String>,

    /// Generation timestamp of the active manifest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,

    /// Timestamp of the last sync attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<String>,

    /// Timestamp of the last verified commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_sync_at: Option<String>,

    /// Most recent failure message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Policy evaluations for display
    pub policy: StatusPolicy,
}

/// One issue reported by the configuration validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path into the configuration document ("" for the root)
    pub path: String,

    /// Human-readable message
    pub message: String,
}

/// Hint metadata for a single plugin-contributed field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginHintProperty {
    /// Field description shown in completion/explain UIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Editor insertion snippet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Declared value type, used to infer a snippet when none is given
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

/// Plugin-contributed hints for fields at one path pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginHintEntry {
    /// Dot-delimited pattern; `*` matches any key or array index
    pub path: String,

    /// Field hints keyed by field name
    pub properties: BTreeMap<String, PluginHintProperty>,
}

/// Versioned plugin hint document shape
#[derive(Debug, Clone, Deserialize)]
pub struct PluginHintDocument {
    /// Document format version (must be 1)
    pub version: u32,

    /// Hint entries
    pub entries: Vec<PluginHintEntry>,
}

/// Where a catalog field entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    /// Derived from the JSON schema itself
    Schema,
    /// Contributed by plugin metadata
    Plugin,
}

/// One candidate configuration field at a path pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    /// Field key
    pub key: String,

    /// Full dotted path including the key
    pub path: String,

    /// Description, when one is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Origin of this entry; plugin entries win over schema entries
    pub source: FieldSource,

    /// Editor insertion snippet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// In-memory index from object-path pattern to candidate fields
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    /// Sorted root-level section names (excluding `$schema`)
    pub sections: Vec<String>,

    /// Field entries keyed by their parent object's dotted pattern
    pub fields_by_pattern: BTreeMap<String, Vec<FieldEntry>>,
}
