//! Dotted-path normalization and wildcard matching

use regex::Regex;
use std::sync::LazyLock;

static BRACKET_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+|\*)\]").expect("bracket segment regex"));

static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\d+(\.|$)").expect("numeric segment regex"));

/// Normalize a dotted path: bracket-array notation is folded to dot
/// notation, segments are trimmed, empty segments dropped
///
/// `channels[0].name` becomes `channels.0.name`; numeric segments are
/// preserved.
pub fn normalize_path(value: &str) -> String {
    let folded = BRACKET_SEGMENT.replace_all(value.trim(), ".$1");
    folded
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Replace numeric segments with the `*` wildcard for hint lookup
pub fn fold_numeric_segments(path: &str) -> String {
    NUMERIC_SEGMENT.replace_all(path, ".*$1").into_owned()
}

/// Whether a concrete path matches a pattern segment-for-segment
///
/// Segment counts must be equal; `*` pattern segments match any key or
/// array index.
pub fn matches_pattern(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = split_segments(pattern);
    let path_segments: Vec<&str> = split_segments(path);
    if pattern_segments.len() != path_segments.len() {
        return false;
    }
    pattern_segments
        .iter()
        .zip(path_segments.iter())
        .all(|(expected, actual)| *expected == "*" || expected == actual)
}

fn split_segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}
