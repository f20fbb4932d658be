//! Schema artifact synchronization for clawsync
//!
//! Provides:
//! - Manifest retrieval with security-policy gating
//! - Hash-verified concurrent artifact download
//! - Atomic cache commit (temp dir + rename, never a partial set)
//! - TTL-based staleness control
//! - Active-root resolution between the download cache and a bundled fallback
//! - Data-driven configuration validation from the validator artifact

pub mod engine;
pub mod manifest;
pub mod state;
pub mod store;
pub mod validator;

pub use engine::{ArtifactSyncEngine, EngineOptions};
pub use manifest::parse_manifest;
pub use store::ArtifactStore;
pub use validator::{CompiledValidator, ValidatorLoad};
