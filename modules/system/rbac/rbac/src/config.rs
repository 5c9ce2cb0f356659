//! Configuration for the rbac module.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "RBAC__";

/// Module configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RbacConfig {
    /// Process-wide subject translation cache.
    pub subject_cache: SubjectCacheConfig,
}

/// Subject translation cache bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubjectCacheConfig {
    /// Maximum number of cached subjects.
    pub capacity: u64,

    /// Time-to-live of an entry, in seconds.
    pub ttl_secs: u64,
}

impl Default for SubjectCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1 << 16,
            ttl_secs: 60,
        }
    }
}

impl SubjectCacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl RbacConfig {
    /// Layer defaults, an optional YAML file and `RBAC__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("loading rbac configuration")
    }
}
