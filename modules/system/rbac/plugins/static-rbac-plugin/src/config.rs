//! Configuration for the static rbac plugin.

use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticRbacPluginConfig {
    /// Vendor name reported by the plugin.
    pub vendor: String,

    /// Evaluation mode.
    pub mode: EvaluationMode,
}

impl Default for StaticRbacPluginConfig {
    fn default() -> Self {
        Self {
            vendor: "hyperspot".to_owned(),
            mode: EvaluationMode::Enforce,
        }
    }
}

/// Evaluation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Apply the role, scope, ACL and negation rules.
    #[default]
    Enforce,
    /// Deny every request. Used to lock a deployment down.
    DenyAll,
}
