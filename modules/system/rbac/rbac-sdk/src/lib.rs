#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! RBAC SDK
//!
//! This crate provides the public API for the `rbac` module:
//!
//! - [`Subject`], [`Role`], [`Scope`], [`Permission`], [`Action`], [`Object`] - Entity model
//! - [`Value`] and [`ToValue`] - Evaluable representation consumed by rule evaluators
//! - [`Predicate`] - Partial-evaluation result for bulk listings
//! - [`RuleEvaluator`] - Plugin API for rule evaluators
//! - [`RoleRegistry`] - Named role / scope resolution
//! - [`AuthzGatewayClient`] - Public API trait for consumers
//! - [`AuthzError`] - Error types
//! - [`pep`] - PEP helpers (predicate → `AccessScope` compiler)
//!
//! ## Usage
//!
//! ```ignore
//! use rbac_sdk::{AuthzGatewayClient, pep, resources, Action};
//!
//! let authz = hub.get::<dyn AuthzGatewayClient>()?;
//!
//! // Single object
//! authz.authorize(&subject, &Action::READ, &object).await?;
//!
//! // Listing: push authorization into storage
//! let scope = authz.access_scope(&subject, &Action::READ, resources::WORKSPACE).await?;
//! let page = store.list_page(&scope, &page_request)?;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod pep;
pub mod plugin_api;
pub mod predicate;
pub mod registry;
pub mod translate;
pub mod value;

// Re-export main types at crate root
pub use api::AuthzGatewayClient;
pub use error::{AuthzError, EvaluatorError, ExpandError, TranslateError};
pub use models::{
    Action, AsObject, Decision, Object, Permission, Role, RoleName, Roles, Scope, ScopeName,
    ScopeRef, Subject, resources,
};
pub use plugin_api::RuleEvaluator;
pub use predicate::{Ceiling, Predicate};
pub use registry::RoleRegistry;
pub use translate::{ToValue, partial_object_value};
pub use value::Value;
