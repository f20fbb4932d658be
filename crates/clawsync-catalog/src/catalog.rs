//! Path-addressable field catalog built from the schema bundle
//!
//! Provides:
//! - A recursive JSON Schema walk that indexes fields by object pattern
//! - Wildcard (`*`) patterns for array items and "any key" maps
//! - UI-hint description resolution with numeric-segment folding
//! - Plugin hint merging where plugin entries beat schema entries

use std::collections::BTreeMap;

use clawsync_core::types::{FieldCatalog, FieldEntry, FieldSource, PluginHintEntry};
use serde::Deserialize;
use serde_json::Value;

use crate::path::{fold_numeric_segments, matches_pattern, normalize_path};

/// One UI hint attached to a dotted path
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UiHint {
    /// Short human-facing label
    pub label: Option<String>,

    /// Longer help text, preferred over the label
    pub help: Option<String>,
}

/// UI hints keyed by normalized dotted path
pub type UiHintRecord = BTreeMap<String, UiHint>;

/// Build the field catalog from schema text, UI hint text, and merged
/// plugin entries
///
/// Unparseable schema or hint text degrades to an empty document rather
/// than failing; the catalog is always usable.
pub fn build_catalog(
    schema_text: &str,
    ui_hints_text: &str,
    plugin_entries: &[PluginHintEntry],
) -> FieldCatalog {
    let schema: Value = serde_json::from_str(schema_text).unwrap_or(Value::Null);
    let hints = parse_ui_hints(ui_hints_text);

    let mut fields_by_pattern: BTreeMap<String, Vec<FieldEntry>> = BTreeMap::new();
    let mut sections: Vec<String> = Vec::new();

    walk_schema(
        &schema,
        &mut Vec::new(),
        &hints,
        &mut fields_by_pattern,
        &mut sections,
    );
    merge_plugin_entries(plugin_entries, &hints, &mut fields_by_pattern);

    sections.sort();
    sections.dedup();

    FieldCatalog {
        sections,
        fields_by_pattern: fields_by_pattern.into_iter().collect(),
    }
}

/// Resolve the fields valid at a raw (possibly bracket-notation) path
///
/// Every pattern that matches the normalized path contributes its fields;
/// duplicates by key collapse with plugin entries winning over schema
/// entries. Output is sorted by key.
pub fn resolve_fields(catalog: &FieldCatalog, raw_path: &str) -> Vec<FieldEntry> {
    let path = normalize_path(raw_path);
    let mut seen: BTreeMap<String, FieldEntry> = BTreeMap::new();

    for (pattern, entries) in &catalog.fields_by_pattern {
        if !matches_pattern(pattern, &path) {
            continue;
        }
        for entry in entries {
            match seen.get(&entry.key) {
                Some(existing)
                    if !(existing.source == FieldSource::Schema
                        && entry.source == FieldSource::Plugin) => {}
                _ => {
                    seen.insert(entry.key.clone(), entry.clone());
                }
            }
        }
    }

    seen.into_values().collect()
}

/// Parse UI hints leniently: non-object documents or entries are dropped
pub(crate) fn parse_ui_hints(raw: &str) -> UiHintRecord {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
        return UiHintRecord::new();
    };
    map.into_iter()
        .filter_map(|(path, value)| {
            serde_json::from_value::<UiHint>(value)
                .ok()
                .map(|hint| (path, hint))
        })
        .collect()
}

/// Look up the hint for a path, falling back to its numeric-segments-folded
/// wildcard form (`channels.0.name` -> `channels.*.name`)
pub(crate) fn resolve_hint<'a>(hints: &'a UiHintRecord, full_path: &str) -> Option<&'a UiHint> {
    let normalized = normalize_path(full_path);
    if normalized.is_empty() {
        return None;
    }
    if let Some(hint) = hints.get(&normalized) {
        return Some(hint);
    }
    hints.get(&fold_numeric_segments(&normalized))
}

fn walk_schema(
    node: &Value,
    segments: &mut Vec<String>,
    hints: &UiHintRecord,
    fields_by_pattern: &mut BTreeMap<String, Vec<FieldEntry>>,
    sections: &mut Vec<String>,
) {
    if !node.is_object() {
        return;
    }

    let object_pattern = segments.join(".");

    for (key, property_node) in collect_properties(node) {
        if segments.is_empty() && key != "$schema" {
            sections.push(key.clone());
        }

        segments.push(key.clone());
        let full_path = segments.join(".");

        let hint = resolve_hint(hints, &full_path);
        let description = hint
            .and_then(|h| h.help.clone().or_else(|| h.label.clone()))
            .or_else(|| string_field(property_node, "description"))
            .or_else(|| string_field(property_node, "title"))
            .filter(|d| !d.is_empty());

        add_field(
            fields_by_pattern,
            &object_pattern,
            FieldEntry {
                key,
                path: full_path,
                description,
                source: FieldSource::Schema,
                snippet: infer_snippet(property_node),
            },
        );

        walk_schema(property_node, segments, hints, fields_by_pattern, sections);
        segments.pop();
    }

    // Object-valued additionalProperties and items both descend under a
    // `*` segment, so map keys and array indices resolve the same way.
    for keyword in ["additionalProperties", "items"] {
        if let Some(child) = node.get(keyword).filter(|v| v.is_object()) {
            segments.push("*".to_string());
            walk_schema(child, segments, hints, fields_by_pattern, sections);
            segments.pop();
        }
    }
}

/// Merge direct `properties` with those of anyOf/oneOf/allOf branches;
/// the first definition of a key wins
fn collect_properties(node: &Value) -> Vec<(String, &Value)> {
    let mut merged: Vec<(String, &Value)> = Vec::new();

    if let Some(Value::Object(direct)) = node.get("properties") {
        for (key, value) in direct {
            if value.is_object() {
                merged.push((key.clone(), value));
            }
        }
    }

    for keyword in ["anyOf", "oneOf", "allOf"] {
        let Some(Value::Array(branches)) = node.get(keyword) else {
            continue;
        };
        for branch in branches {
            if !branch.is_object() {
                continue;
            }
            for (key, value) in collect_properties(branch) {
                if !merged.iter().any(|(existing, _)| *existing == key) {
                    merged.push((key, value));
                }
            }
        }
    }

    merged
}

fn merge_plugin_entries(
    entries: &[PluginHintEntry],
    hints: &UiHintRecord,
    fields_by_pattern: &mut BTreeMap<String, Vec<FieldEntry>>,
) {
    for entry in entries {
        let pattern = normalize_path(&entry.path);
        for (field_key, field_hint) in &entry.properties {
            let key = field_key.trim();
            if key.is_empty() {
                continue;
            }
            let full_path = if pattern.is_empty() {
                key.to_string()
            } else {
                format!("{pattern}.{key}")
            };
            let hint = resolve_hint(hints, &full_path);
            let description = field_hint
                .description
                .clone()
                .or_else(|| hint.and_then(|h| h.help.clone().or_else(|| h.label.clone())));
            let snippet = field_hint
                .snippet
                .clone()
                .or_else(|| snippet_for_type(field_hint.value_type.as_deref()));

            add_field(
                fields_by_pattern,
                &pattern,
                FieldEntry {
                    key: key.to_string(),
                    path: full_path,
                    description,
                    source: FieldSource::Plugin,
                    snippet,
                },
            );
        }
    }
}

/// Insert a field under a pattern; a plugin candidate replaces an existing
/// schema entry with the same key, anything else keeps the first entry
fn add_field(
    fields_by_pattern: &mut BTreeMap<String, Vec<FieldEntry>>,
    pattern: &str,
    candidate: FieldEntry,
) {
    let entries = fields_by_pattern.entry(pattern.to_string()).or_default();
    match entries.iter_mut().find(|entry| entry.key == candidate.key) {
        None => entries.push(candidate),
        Some(existing)
            if existing.source == FieldSource::Schema
                && candidate.source == FieldSource::Plugin =>
        {
            *existing = candidate;
        }
        Some(_) => {}
    }
}

fn infer_snippet(node: &Value) -> Option<String> {
    let declared = match node.get("type") {
        Some(Value::String(ty)) => Some(ty.as_str()),
        Some(Value::Array(types)) => types.first().and_then(Value::as_str),
        _ => None,
    };
    snippet_for_type(declared)
}

fn snippet_for_type(declared: Option<&str>) -> Option<String> {
    let snippet = match declared? {
        "object" => "{\n  $1\n}",
        "array" => "[\n  $1\n]",
        "string" => "\"${1:value}\"",
        "integer" | "number" => "${1:0}",
        "boolean" => "${1|true,false|}",
        _ => return None,
    };
    Some(snippet.to_string())
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}
