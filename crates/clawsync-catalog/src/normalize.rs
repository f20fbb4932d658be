//! Canonical formatting for OpenClaw configuration documents
//!
//! Normalization produces a stable, diff-friendly rendering: the `$schema`
//! marker first, root keys in UI-hint `order`, every other object sorted
//! lexicographically, two-space indentation, trailing newline.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use clawsync_core::constants::OPENCLAW_SCHEMA_URI;
use serde_json::{Map, Value};

/// Root-key ordering hints: UI hint entries with a dot-free key and a
/// numeric `order` field
type OrderHints = BTreeMap<String, f64>;

/// Normalize a configuration document to its canonical text form
///
/// Returns `None` when the input is not a JSON object; the caller keeps
/// the original text in that case.
pub fn normalize_config_text(text: &str, ui_hints_text: &str) -> Option<String> {
    let Ok(Value::Object(mut root)) = serde_json::from_str::<Value>(text) else {
        return None;
    };

    let has_schema_marker = root
        .get("$schema")
        .and_then(Value::as_str)
        .is_some_and(|uri| !uri.trim().is_empty());
    if !has_schema_marker {
        root.insert(
            "$schema".to_string(),
            Value::String(OPENCLAW_SCHEMA_URI.to_string()),
        );
    }

    let order_hints = parse_order_hints(ui_hints_text);
    let normalized = sort_value(Value::Object(root), 0, &order_hints);
    let mut rendered = serde_json::to_string_pretty(&normalized).ok()?;
    rendered.push('\n');
    Some(rendered)
}

fn parse_order_hints(ui_hints_text: &str) -> OrderHints {
    let Ok(Value::Object(parsed)) = serde_json::from_str::<Value>(ui_hints_text) else {
        return OrderHints::new();
    };
    parsed
        .into_iter()
        .filter(|(key, _)| !key.contains('.'))
        .filter_map(|(key, value)| {
            value
                .get("order")
                .and_then(Value::as_f64)
                .map(|order| (key, order))
        })
        .collect()
}

fn sort_value(value: Value, depth: usize, order_hints: &OrderHints) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sort_value(item, depth + 1, order_hints))
                .collect(),
        ),
        Value::Object(object) => {
            let mut entries: Vec<(String, Value)> = object.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_keys(depth == 0, a, b, order_hints));

            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key, sort_value(child, depth + 1, order_hints));
            }
            Value::Object(sorted)
        }
        other => other,
    }
}

fn compare_keys(at_root: bool, a: &str, b: &str, order_hints: &OrderHints) -> Ordering {
    if at_root {
        if a == "$schema" {
            return Ordering::Less;
        }
        if b == "$schema" {
            return Ordering::Greater;
        }
        let a_order = order_hints.get(a).copied().unwrap_or(f64::MAX);
        let b_order = order_hints.get(b).copied().unwrap_or(f64::MAX);
        if a_order != b_order {
            return a_order.partial_cmp(&b_order).unwrap_or(Ordering::Equal);
        }
    }
    a.cmp(b)
}
