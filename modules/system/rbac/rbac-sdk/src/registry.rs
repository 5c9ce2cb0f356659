//! Named role and scope resolution.

use crate::error::ExpandError;
use crate::models::{Role, RoleName, Scope, ScopeName};

/// Resolves role and scope names into their definitions.
///
/// Implementations are shared across request threads.
pub trait RoleRegistry: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExpandError::UnknownRole`] if the name has no definition.
    fn resolve_role(&self, name: &RoleName) -> Result<Role, ExpandError>;

    /// # Errors
    ///
    /// Returns [`ExpandError::UnknownScope`] if the name has no definition.
    fn resolve_scope(&self, name: &ScopeName) -> Result<Scope, ExpandError>;

    /// Digest of every definition this registry can return.
    ///
    /// Mixed into translation cache keys, so it must change whenever any
    /// resolvable definition changes.
    fn fingerprint(&self) -> [u8; 32];
}
