//! Built-in roles, scopes and the static role registry.
//!
//! Static built-in roles never change, so they are snapshotted once with
//! their translation attached. Organization-parametrized roles are built on
//! demand and carry no cached value.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rbac_sdk::{
    Action, ExpandError, Permission, Role, RoleName, RoleRegistry, Scope, ScopeName, resources,
};
use sha2::{Digest, Sha256};

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_MEMBER: &str = "member";
pub const ROLE_AUDITOR: &str = "auditor";
pub const ROLE_ORG_ADMIN_PREFIX: &str = "organization-admin";
pub const ROLE_ORG_MEMBER_PREFIX: &str = "organization-member";

/// Parametrized role names use `<prefix>:<org_id>`.
const ROLE_PARAM_SEPARATOR: char = ':';

fn all_permissions() -> Vec<Permission> {
    vec![Permission::allow(resources::WILDCARD, Action::WILDCARD)]
}

static STATIC_ROLES: LazyLock<BTreeMap<&'static str, Role>> = LazyLock::new(|| {
    let owner = Role::new(ROLE_OWNER).with_site(all_permissions());
    let member = Role::new(ROLE_MEMBER)
        .with_site(vec![Permission::allow(resources::ORGANIZATION, Action::READ)])
        .with_user(all_permissions());
    let auditor = Role::new(ROLE_AUDITOR)
        .with_site(vec![Permission::allow(resources::AUDIT_LOG, Action::READ)]);

    BTreeMap::from([
        (ROLE_OWNER, owner.with_cached_value()),
        (ROLE_MEMBER, member.with_cached_value()),
        (ROLE_AUDITOR, auditor.with_cached_value()),
    ])
});

static BUILTIN_SCOPES: LazyLock<BTreeMap<&'static str, Scope>> = LazyLock::new(|| {
    let all = Scope::new(Role::new("scope:all").with_site(all_permissions()).with_cached_value());
    let application_connect = Scope::new(
        Role::new("scope:application_connect")
            .with_site(vec![Permission::allow(
                resources::WORKSPACE,
                Action::new("application_connect"),
            )])
            .with_cached_value(),
    );
    BTreeMap::from([
        (ScopeName::ALL, all),
        (ScopeName::APPLICATION_CONNECT, application_connect),
    ])
});

/// Full control over one organization.
#[must_use]
pub fn organization_admin(org_id: &str) -> Role {
    Role::new(format!("{ROLE_ORG_ADMIN_PREFIX}{ROLE_PARAM_SEPARATOR}{org_id}"))
        .with_org(org_id, all_permissions())
}

/// Read access to one organization, its members and templates.
#[must_use]
pub fn organization_member(org_id: &str) -> Role {
    Role::new(format!("{ROLE_ORG_MEMBER_PREFIX}{ROLE_PARAM_SEPARATOR}{org_id}")).with_org(
        org_id,
        vec![
            Permission::allow(resources::ORGANIZATION, Action::READ),
            Permission::allow(resources::ORGANIZATION_MEMBER, Action::READ),
            Permission::allow(resources::TEMPLATE, Action::READ),
        ],
    )
}

/// Resolve a built-in role name, including organization-parametrized names.
#[must_use]
pub fn builtin_role(name: &str) -> Option<Role> {
    if let Some(role) = STATIC_ROLES.get(name) {
        return Some(role.clone());
    }
    let (prefix, org_id) = name.split_once(ROLE_PARAM_SEPARATOR)?;
    if org_id.is_empty() {
        return None;
    }
    match prefix {
        ROLE_ORG_ADMIN_PREFIX => Some(organization_admin(org_id)),
        ROLE_ORG_MEMBER_PREFIX => Some(organization_member(org_id)),
        _ => None,
    }
}

#[must_use]
pub fn builtin_scope(name: &str) -> Option<Scope> {
    BUILTIN_SCOPES.get(name).cloned()
}

fn is_reserved(name: &str) -> bool {
    builtin_role(name).is_some()
        || name.starts_with(&format!("{ROLE_ORG_ADMIN_PREFIX}{ROLE_PARAM_SEPARATOR}"))
        || name.starts_with(&format!("{ROLE_ORG_MEMBER_PREFIX}{ROLE_PARAM_SEPARATOR}"))
}

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

/// Registry of built-in roles and scopes plus custom roles added at runtime.
///
/// Custom roles never carry a cached translation.
#[derive(Debug)]
pub struct StaticRoleRegistry {
    id: u64,
    generation: AtomicU64,
    custom: DashMap<String, Role>,
}

impl Default for StaticRoleRegistry {
    fn default() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            generation: AtomicU64::new(0),
            custom: DashMap::new(),
        }
    }
}

impl StaticRoleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a custom role.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidRole`] if the role has a malformed
    /// permission or its name is reserved for a built-in role.
    pub fn register_role(&self, role: Role) -> Result<(), ExpandError> {
        if role.name.is_empty() || is_reserved(&role.name) {
            return Err(ExpandError::InvalidRole(role.name));
        }
        role.validate()?;
        tracing::debug!(role = %role.name, "registered custom role");
        self.custom
            .insert(role.name.clone(), role.without_cached_value());
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Remove a custom role, returning it if it existed.
    pub fn remove_role(&self, name: &str) -> Option<Role> {
        let removed = self.custom.remove(name).map(|(_, role)| role);
        if removed.is_some() {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }
}

impl RoleRegistry for StaticRoleRegistry {
    fn resolve_role(&self, name: &RoleName) -> Result<Role, ExpandError> {
        if let Some(role) = builtin_role(name.as_str()) {
            return Ok(role);
        }
        self.custom
            .get(name.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ExpandError::UnknownRole(name.to_string()))
    }

    fn resolve_scope(&self, name: &ScopeName) -> Result<Scope, ExpandError> {
        builtin_scope(name.as_str()).ok_or_else(|| ExpandError::UnknownScope(name.to_string()))
    }

    fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"static-role-registry");
        hasher.update(self.id.to_be_bytes());
        hasher.update(self.generation.load(Ordering::Acquire).to_be_bytes());
        hasher.finalize().into()
    }
}
