#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Access scopes handed from the authorization core to the storage layer.
//!
//! An [`AccessScope`] is a disjunction of [`ScopeConstraint`]s, each a
//! conjunction of [`ScopeFilter`]s over named resource properties. Storage
//! adapters resolve property names to columns and AND the result into
//! their listing queries.

pub mod access_scope;

pub use access_scope::{
    AccessScope, AclRequirement, FilterOp, ScopeConstraint, ScopeFilter, WILDCARD, acl_group_key,
    acl_user_key, pattern_matches, properties,
};
