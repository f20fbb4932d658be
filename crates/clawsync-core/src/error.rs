//! Error types for clawsync-core

use thiserror::Error;

/// Result type alias using clawsync-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for clawsync
#[derive(Error, Debug)]
pub enum Error {
    /// URL rejected by the security policy
    #[error("Blocked by security policy: {reason}")]
    PolicyBlocked { reason: String },

    /// Network-level fetch failure
    #[error("Fetch failed for {url}: {message}")]
    Transport { url: String, message: String },

    /// Non-2xx HTTP response
    #[error("Fetch failed ({status}) for {url}")]
    FetchFailed { status: u16, url: String },

    /// Manifest failed structural validation
    #[error("Invalid manifest: {message}")]
    InvalidManifest { message: String },

    /// Downloaded artifact bytes do not match the declared digest
    #[error("SHA-256 mismatch for {url}")]
    HashMismatch { url: String },

    /// Plugin hint document failed structural validation
    #[error("Invalid plugin metadata: {message}")]
    InvalidPluginDocument { message: String },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a policy-blocked error
    pub fn policy_blocked(reason: impl Into<String>) -> Self {
        Self::PolicyBlocked {
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a non-2xx response error
    pub fn fetch_failed(status: u16, url: impl Into<String>) -> Self {
        Self::FetchFailed {
            status,
            url: url.into(),
        }
    }

    /// Create an invalid manifest error
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    /// Create a hash mismatch error
    pub fn hash_mismatch(url: impl Into<String>) -> Self {
        Self::HashMismatch { url: url.into() }
    }

    /// Create an invalid plugin document error
    pub fn invalid_plugin_document(message: impl Into<String>) -> Self {
        Self::InvalidPluginDocument {
            message: message.into(),
        }
    }
}
