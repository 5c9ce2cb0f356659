#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Static rbac plugin
//!
//! Built-in [`RuleEvaluator`](rbac_sdk::RuleEvaluator) implementing the
//! permission-resolution rules over translated values:
//!
//! - site, org and user role levels, plus per-object user and group ACLs
//! - the scope allow-list and scope role as a hard ceiling
//! - negation dominating every grant
//!
//! Partial evaluation derives a [`Predicate`](rbac_sdk::Predicate) for listings.

pub mod config;
pub mod domain;

pub use config::{EvaluationMode, StaticRbacPluginConfig};
pub use domain::Service;
