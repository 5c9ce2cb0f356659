//! Scope enforcement for stored rows.

mod cond;

pub use cond::row_matches;

/// One ACL entry attached to a row for a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclEntry<'a> {
    pub resource_type: &'a str,
    pub action: &'a str,
    pub negate: bool,
}

/// A row that can be filtered by an [`authz_scope::AccessScope`].
///
/// Property names are authorization concepts (see
/// [`authz_scope::properties`]); mapping them to row fields happens here.
pub trait ScopableRow {
    /// Resolve an authorization property to this row's value.
    ///
    /// Returns `None` for properties the row does not know, which fails the
    /// enclosing constraint. A known but unset property resolves to `""`.
    fn resolve_property(&self, property: &str) -> Option<&str>;

    /// ACL entries granted on this row to the principal with the given key
    /// (see [`authz_scope::acl_user_key`] / [`authz_scope::acl_group_key`]).
    fn acl_entries(&self, principal_key: &str) -> Vec<AclEntry<'_>>;
}
