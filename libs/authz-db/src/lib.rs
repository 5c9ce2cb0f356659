#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reference storage layer for scoped listings.
//!
//! Applies an [`authz_scope::AccessScope`] to rows server-side while
//! paginating with a stable `(created_at, id)` keyset, and soft-deletes rows
//! through [`InMemoryStore::prune`].

pub mod error;
pub mod secure;
pub mod store;

pub use error::StoreError;
pub use secure::{AclEntry, ScopableRow, row_matches};
pub use store::{InMemoryStore, Page, PageInfo, PageRequest, PruneFilter, StoredRow};
