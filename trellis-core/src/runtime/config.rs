//! Root Configuration

use serde::Deserialize;

/// Per-root settings.
///
/// Deserializable so embedders can keep it next to the rest of their
/// configuration; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Log component render errors before replacing the failing component
    /// with a placeholder. Enabled by default in debug builds.
    pub log_component_errors: bool,
}

impl RootConfig {
    /// Settings for release deployments: errors are contained silently.
    pub fn production() -> Self {
        Self {
            log_component_errors: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            log_component_errors: cfg!(debug_assertions),
        }
    }
}
