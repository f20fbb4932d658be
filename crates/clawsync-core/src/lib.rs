//! # clawsync-core
//!
//! Core library for clawsync providing:
//! - Shared type definitions for manifests, sync state, and field catalogs
//! - Security policy evaluation for upstream URLs
//! - Error types shared across the workspace
//! - Small utilities (TTL clamping, SHA-256 digests)

pub mod constants;
pub mod error;
pub mod security;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use security::evaluate_url;
pub use types::{ArtifactSource, SchemaManifest, SecurityEvaluation, SecurityPolicy, SyncResult};
