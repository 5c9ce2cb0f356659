#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! rbac module
//!
//! Decides whether a subject may perform an action on an object, and derives
//! storage-ready access scopes for listings:
//!
//! - [`Translator`] turns entities into evaluable values, with subjects
//!   memoized in the process-wide [`SubjectCache`]
//! - [`AuthzEngine`] asks a [`RuleEvaluator`](rbac_sdk::RuleEvaluator) for
//!   single decisions and listing predicates
//! - [`PreparedAuthorizer`] pairs a predicate with its compiled `AccessScope`
//! - [`AuthzGwLocalClient`] exposes the engine as an
//!   [`AuthzGatewayClient`](rbac_sdk::AuthzGatewayClient)
//!
//! ```ignore
//! let cfg = RbacConfig::load(Some(Path::new("config/rbac.yaml")))?;
//! let engine = AuthzEngine::from_config(&cfg, evaluator, Arc::new(StaticRoleRegistry::new()));
//! engine.authorize(&subject, &Action::UPDATE, &object)?;
//! ```

pub mod config;
pub mod domain;

pub use config::{RbacConfig, SubjectCacheConfig};
pub use domain::{
    AuthzEngine, AuthzGwLocalClient, CacheStats, DomainError, PreparedAuthorizer,
    StaticRoleRegistry, SubjectCache, Translator,
};
