//! Well-known names and defaults shared across the workspace

/// Default manifest URL checked when none is configured
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/jorekai/openclaw-config-vscode/main/schemas/live/manifest.json";

/// Hosts trusted by the default security policy
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["raw.githubusercontent.com"];

/// Repositories trusted by the default security policy
pub const DEFAULT_ALLOWED_REPOSITORIES: &[&str] = &["jorekai/openclaw-config-vscode"];

/// File name of the configuration document this tooling serves
pub const CONFIG_FILE_NAME: &str = "openclaw.json";

/// Synthetic URI injected as `$schema` when normalizing configuration text
pub const OPENCLAW_SCHEMA_URI: &str = "openclaw-schema://live/openclaw.schema.json";

/// File name of the schema artifact inside an artifact root
pub const SCHEMA_FILE_NAME: &str = "openclaw.schema.json";

/// File name of the UI hints artifact inside an artifact root
pub const UI_HINTS_FILE_NAME: &str = "openclaw.ui-hints.json";

/// File name of the validator artifact inside an artifact root
pub const VALIDATOR_FILE_NAME: &str = "openclaw.validator.json";

/// File name of the committed manifest inside an artifact root
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// All four files that must be present for an artifact root to be complete
pub const REQUIRED_ARTIFACT_FILES: &[&str] = &[
    SCHEMA_FILE_NAME,
    UI_HINTS_FILE_NAME,
    VALIDATOR_FILE_NAME,
    MANIFEST_FILE_NAME,
];
