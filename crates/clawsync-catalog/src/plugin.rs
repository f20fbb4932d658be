//! Plugin hint metadata loading
//!
//! Two independent, best-effort layers: an optional remote document (gated
//! by the security policy) and an optional local file. Either layer failing
//! yields zero entries plus a warning string - loading never fails the
//! caller. Layers merge in `[remote, local]` order so an integrator's own
//! project overrides community hints per field key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clawsync_core::error::{Error, Result};
use clawsync_core::security::evaluate_url;
use clawsync_core::types::{
    PluginHintDocument, PluginHintEntry, PluginHintProperty, SecurityPolicy,
};
use tracing::{debug, warn};

use crate::path::normalize_path;

/// Bounded timeout for remote metadata fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Supported plugin hint document version
pub const PLUGIN_DOCUMENT_VERSION: u32 = 1;

/// Merged plugin hint entries plus any per-layer warnings
#[derive(Debug, Default)]
pub struct PluginHintLoadResult {
    /// Entries merged across layers, keyed by normalized path
    pub entries: Vec<PluginHintEntry>,

    /// Human-readable warnings for layers that could not be used
    pub warnings: Vec<String>,
}

/// Loader for plugin-contributed field hints
pub struct PluginHintLoader {
    client: reqwest::Client,
    policy: SecurityPolicy,
}

impl PluginHintLoader {
    /// Create a loader with the given security policy
    pub fn new(policy: SecurityPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| Error::transport("plugin metadata client", e.to_string()))?;
        Ok(Self { client, policy })
    }

    /// Replace the security policy (settings change)
    pub fn set_policy(&mut self, policy: SecurityPolicy) {
        self.policy = policy;
    }

    /// Load and merge the remote and local hint layers
    ///
    /// The remote layer is only attempted when a non-empty URL is
    /// configured; the local layer needs both a workspace root and a path.
    /// A missing local file is "no entries", not a warning.
    pub async fn load(
        &self,
        workspace_root: Option<&Path>,
        local_path: Option<&str>,
        remote_url: Option<&str>,
    ) -> PluginHintLoadResult {
        let mut warnings = Vec::new();
        let mut layers = Vec::new();

        if let Some(remote_url) = remote_url.map(str::trim).filter(|url| !url.is_empty()) {
            match self.load_remote(remote_url).await {
                Ok(entries) => layers.push(entries),
                Err(e) => warnings.push(format!("Remote plugin metadata failed: {e}")),
            }
        }

        if let (Some(workspace_root), Some(local_path)) = (
            workspace_root,
            local_path.map(str::trim).filter(|path| !path.is_empty()),
        ) {
            match load_local(workspace_root, local_path).await {
                Ok(entries) => layers.push(entries),
                Err(e) => warnings.push(format!("Local plugin metadata failed: {e}")),
            }
        }

        PluginHintLoadResult {
            entries: merge_layers(layers),
            warnings,
        }
    }

    async fn load_remote(&self, remote_url: &str) -> Result<Vec<PluginHintEntry>> {
        let evaluation = evaluate_url(remote_url, &self.policy);
        if !evaluation.allowed {
            return Err(Error::policy_blocked(evaluation.reason));
        }

        debug!("Fetching plugin metadata from {}", remote_url);
        let response = self
            .client
            .get(remote_url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| Error::transport(remote_url, e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::fetch_failed(response.status().as_u16(), remote_url));
        }
        let raw = response
            .text()
            .await
            .map_err(|e| Error::transport(remote_url, e.to_string()))?;
        parse_plugin_hint_document(&raw, "remote")
    }
}

async fn load_local(workspace_root: &Path, local_path: &str) -> Result<Vec<PluginHintEntry>> {
    let resolved: PathBuf = if Path::new(local_path).is_absolute() {
        local_path.into()
    } else {
        workspace_root.join(local_path)
    };

    let raw = match tokio::fs::read_to_string(&resolved).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    parse_plugin_hint_document(&raw, "local")
}

/// Parse and validate one hint document, normalizing paths and trimming
/// property strings
///
/// Invalid shapes are rejected wholesale, never partially accepted.
pub fn parse_plugin_hint_document(raw: &str, source: &str) -> Result<Vec<PluginHintEntry>> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::invalid_plugin_document(format!("invalid {source} JSON: {e}")))?;
    let document: PluginHintDocument = serde_json::from_value(value).map_err(|_| {
        Error::invalid_plugin_document(format!("invalid {source} shape (expected version=1)"))
    })?;

    if document.version != PLUGIN_DOCUMENT_VERSION {
        return Err(Error::invalid_plugin_document(format!(
            "invalid {source} shape (expected version=1)"
        )));
    }
    for entry in &document.entries {
        if entry.path.trim().is_empty() {
            return Err(Error::invalid_plugin_document(format!(
                "invalid {source} shape (entry with empty path)"
            )));
        }
        if entry.properties.keys().any(|key| key.trim().is_empty()) {
            return Err(Error::invalid_plugin_document(format!(
                "invalid {source} shape (property with empty key)"
            )));
        }
    }

    Ok(document
        .entries
        .into_iter()
        .map(|entry| PluginHintEntry {
            path: normalize_path(&entry.path),
            properties: entry
                .properties
                .into_iter()
                .map(|(key, property)| (key.trim().to_string(), trim_property(property)))
                .collect(),
        })
        .collect())
}

fn trim_property(property: PluginHintProperty) -> PluginHintProperty {
    PluginHintProperty {
        description: trim_optional(property.description),
        snippet: trim_optional(property.snippet),
        value_type: trim_optional(property.value_type),
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Merge hint layers by normalized path; a later layer overwrites an
/// earlier one per field key, keys unique to either layer are preserved
fn merge_layers(layers: Vec<Vec<PluginHintEntry>>) -> Vec<PluginHintEntry> {
    let mut merged: BTreeMap<String, BTreeMap<String, PluginHintProperty>> = BTreeMap::new();

    for layer in layers {
        for entry in layer {
            let properties = merged.entry(normalize_path(&entry.path)).or_default();
            for (key, property) in entry.properties {
                properties.insert(key, property);
            }
        }
    }

    if merged.is_empty() {
        Vec::new()
    } else {
        warn_on_empty(&merged);
        merged
            .into_iter()
            .map(|(path, properties)| PluginHintEntry { path, properties })
            .collect()
    }
}

fn warn_on_empty(merged: &BTreeMap<String, BTreeMap<String, PluginHintProperty>>) {
    for (path, properties) in merged {
        if properties.is_empty() {
            warn!("Plugin hint entry for '{}' declares no properties", path);
        }
    }
}
