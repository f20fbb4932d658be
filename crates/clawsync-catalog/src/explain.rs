//! Markdown rendering for "explain this config path" requests

use clawsync_core::types::FieldCatalog;

use crate::catalog::{parse_ui_hints, resolve_fields, resolve_hint};
use crate::path::normalize_path;

/// Cap on listed subfields to keep hover/explain output readable
const MAX_LISTED_SUBFIELDS: usize = 20;

/// Render a markdown explanation for a config path: a heading from the UI
/// hint label (or the path itself), optional help text, and the allowed
/// subfields at that position
pub fn build_field_explain_markdown(
    path: &str,
    catalog: &FieldCatalog,
    ui_hints_text: &str,
) -> String {
    let normalized = normalize_path(path);
    let hints = parse_ui_hints(ui_hints_text);
    let hint = resolve_hint(&hints, &normalized);
    let subfields = resolve_fields(catalog, &normalized);

    let title = hint
        .and_then(|h| h.label.clone())
        .unwrap_or_else(|| normalized.clone());
    let mut lines = vec![format!(
        "### {}",
        if title.is_empty() {
            "Root Config"
        } else {
            title.as_str()
        }
    )];

    if let Some(help) = hint.and_then(|h| h.help.as_deref()) {
        lines.push(String::new());
        lines.push(help.to_string());
    }

    if subfields.is_empty() {
        lines.push(String::new());
        lines.push("No further subfields detected for this path.".to_string());
    } else {
        lines.push(String::new());
        lines.push("Allowed subfields:".to_string());
        for entry in subfields.iter().take(MAX_LISTED_SUBFIELDS) {
            match &entry.description {
                Some(description) => lines.push(format!("- `{}` - {}", entry.key, description)),
                None => lines.push(format!("- `{}`", entry.key)),
            }
        }
    }

    lines.join("\n")
}
