//! Dynamic field catalog for OpenClaw configurations
//!
//! Provides:
//! - Plugin hint metadata loading from local files and remote documents
//! - A path-addressable field catalog built from the schema bundle
//! - Wildcard-aware lookup for array/"any key" positions
//! - Field explain rendering and canonical config normalization

pub mod catalog;
pub mod explain;
pub mod normalize;
pub mod path;
pub mod plugin;

pub use catalog::{build_catalog, resolve_fields, UiHint, UiHintRecord};
pub use explain::build_field_explain_markdown;
pub use normalize::normalize_config_text;
pub use plugin::{PluginHintLoadResult, PluginHintLoader};
