//! Entity model for the `rbac` module.
//!
//! Subjects, roles, scopes and objects are plain value types. They are
//! constructed per request (or loaded from a store outside this module) and
//! never mutated by evaluation.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use authz_scope::{WILDCARD, pattern_matches};
use serde::{Deserialize, Serialize};

use crate::error::ExpandError;
use crate::registry::RoleRegistry;
use crate::value::Value;

/// Well-known resource types.
pub mod resources {
    /// Matches every resource type.
    pub const WILDCARD: &str = authz_scope::WILDCARD;
    pub const WORKSPACE: &str = "workspace";
    pub const TEMPLATE: &str = "template";
    pub const TEMPLATE_VERSION: &str = "template_version";
    pub const USER: &str = "user";
    pub const ORGANIZATION: &str = "organization";
    pub const ORGANIZATION_MEMBER: &str = "organization_member";
    pub const API_KEY: &str = "api_key";
    pub const AUDIT_LOG: &str = "audit_log";
    pub const FILE: &str = "file";
}

/// A verb performed on a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(Cow<'static, str>);

impl Action {
    pub const READ: Action = Action(Cow::Borrowed("read"));
    pub const CREATE: Action = Action(Cow::Borrowed("create"));
    pub const UPDATE: Action = Action(Cow::Borrowed("update"));
    pub const DELETE: Action = Action(Cow::Borrowed("delete"));
    /// Matches every action when used inside a [`Permission`].
    pub const WILDCARD: Action = Action(Cow::Borrowed(WILDCARD));

    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Action {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

/// A single rule entry: grant (or, with `negate`, deny) `action` on `resource_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default)]
    pub negate: bool,
    pub resource_type: String,
    pub action: Action,
}

impl Permission {
    #[must_use]
    pub fn allow(resource_type: impl Into<String>, action: impl Into<Action>) -> Self {
        Self {
            negate: false,
            resource_type: resource_type.into(),
            action: action.into(),
        }
    }

    #[must_use]
    pub fn deny(resource_type: impl Into<String>, action: impl Into<Action>) -> Self {
        Self {
            negate: true,
            ..Self::allow(resource_type, action)
        }
    }

    /// Neither the resource type nor the action may be empty.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.resource_type.is_empty() && !self.action.as_str().is_empty()
    }

    /// Returns `true` if this entry applies to `(resource_type, action)`,
    /// honouring wildcards.
    #[must_use]
    pub fn applies_to(&self, resource_type: &str, action: &Action) -> bool {
        pattern_matches(&self.resource_type, resource_type)
            && pattern_matches(self.action.as_str(), action.as_str())
    }
}

/// A named bundle of permissions split by applicability level.
///
/// `cached_value` holds a precomputed translation. It is only attached via
/// [`Role::with_cached_value`], which returns a copy, and is ignored by
/// serialization and equality. Permissions are only reachable through the
/// builders, and every builder drops the cached translation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    site: Vec<Permission>,
    /// Organization ID → permissions applying to objects of that organization.
    #[serde(default)]
    org: BTreeMap<String, Vec<Permission>>,
    /// Permissions applying to objects owned by the subject.
    #[serde(default)]
    user: Vec<Permission>,
    #[serde(skip)]
    cached_value: Option<Value>,
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.site == other.site
            && self.org == other.org
            && self.user == other.user
    }
}

impl Eq for Role {}

impl Role {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_site(mut self, permissions: Vec<Permission>) -> Self {
        self.site = permissions;
        self.without_cached_value()
    }

    #[must_use]
    pub fn with_org(mut self, org_id: impl Into<String>, permissions: Vec<Permission>) -> Self {
        self.org.insert(org_id.into(), permissions);
        self.without_cached_value()
    }

    #[must_use]
    pub fn with_user(mut self, permissions: Vec<Permission>) -> Self {
        self.user = permissions;
        self.without_cached_value()
    }

    #[inline]
    #[must_use]
    pub fn site(&self) -> &[Permission] {
        &self.site
    }

    #[inline]
    #[must_use]
    pub fn org(&self) -> &BTreeMap<String, Vec<Permission>> {
        &self.org
    }

    #[inline]
    #[must_use]
    pub fn user(&self) -> &[Permission] {
        &self.user
    }

    /// Returns a copy carrying its own translation.
    ///
    /// Only meaningful for roles whose content never changes (built-ins).
    /// The receiver is left untouched.
    #[must_use]
    pub fn with_cached_value(&self) -> Self {
        let mut copy = Self {
            cached_value: None,
            ..self.clone()
        };
        copy.cached_value = Some(crate::translate::role_value(&copy));
        copy
    }

    /// Drops the precomputed translation, if any.
    #[must_use]
    pub fn without_cached_value(mut self) -> Self {
        self.cached_value = None;
        self
    }

    #[inline]
    #[must_use]
    pub fn cached_value(&self) -> Option<&Value> {
        self.cached_value.as_ref()
    }

    /// Every permission of the role, across all levels.
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.site
            .iter()
            .chain(self.org.values().flatten())
            .chain(self.user.iter())
    }

    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidRole`] if any permission is malformed.
    pub fn validate(&self) -> Result<(), ExpandError> {
        if self.permissions().all(Permission::is_well_formed) {
            Ok(())
        } else {
            Err(ExpandError::InvalidRole(self.name.clone()))
        }
    }
}

/// A role restriction, optionally limited to an explicit list of object IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub role: Role,
    /// Empty means unrestricted.
    #[serde(default)]
    pub allow_id_list: Vec<String>,
}

impl Scope {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            allow_id_list: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_allow_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_id_list = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `false` if the allow-list is non-empty and does not contain `id`.
    #[must_use]
    pub fn allows_id(&self, id: &str) -> bool {
        self.allow_id_list.is_empty() || self.allow_id_list.iter().any(|allowed| allowed == id)
    }
}

/// Name of a built-in scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeName(pub String);

impl ScopeName {
    pub const ALL: &'static str = "all";
    pub const APPLICATION_CONNECT: &'static str = "application_connect";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn all() -> Self {
        Self::new(Self::ALL)
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subject's scope: a built-in by name or an inline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeRef {
    Builtin(ScopeName),
    Custom(Scope),
}

impl Default for ScopeRef {
    fn default() -> Self {
        Self::Builtin(ScopeName::all())
    }
}

impl ScopeRef {
    /// An inline scope role loses any precomputed translation.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::UnknownScope`] for an undefined built-in name,
    /// or [`ExpandError::InvalidRole`] if the scope role is malformed.
    pub fn expand(&self, registry: &dyn RoleRegistry) -> Result<Scope, ExpandError> {
        let scope = match self {
            Self::Builtin(name) => registry.resolve_scope(name)?,
            Self::Custom(scope) => Scope {
                role: scope.role.clone().without_cached_value(),
                allow_id_list: scope.allow_id_list.clone(),
            },
        };
        scope.role.validate()?;
        Ok(scope)
    }
}

/// Name of a role resolved through a [`RoleRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(pub String);

impl RoleName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A subject's roles, either by name or already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Roles {
    Names(Vec<RoleName>),
    Resolved(Vec<Role>),
}

impl Default for Roles {
    fn default() -> Self {
        Self::Names(Vec::new())
    }
}

impl Roles {
    /// Resolve every role and check its permissions are well formed.
    ///
    /// Caller-supplied roles lose any precomputed translation; only roles
    /// resolved through the registry keep theirs.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::UnknownRole`] for an undefined name and
    /// [`ExpandError::InvalidRole`] for a malformed role.
    pub fn expand(&self, registry: &dyn RoleRegistry) -> Result<Vec<Role>, ExpandError> {
        let roles = match self {
            Self::Names(names) => names
                .iter()
                .map(|name| registry.resolve_role(name))
                .collect::<Result<Vec<_>, _>>()?,
            Self::Resolved(roles) => roles
                .iter()
                .map(|role| role.clone().without_cached_value())
                .collect(),
        };
        for role in &roles {
            role.validate()?;
        }
        Ok(roles)
    }
}

/// The requesting principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    #[serde(default)]
    pub roles: Roles,
    #[serde(default)]
    pub scope: ScopeRef,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Subject {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_role_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = Roles::Names(names.into_iter().map(RoleName::new).collect());
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = Roles::Resolved(roles);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: ScopeRef) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

/// The resource being accessed.
///
/// An empty `org_id` means the object belongs to no organization; an empty
/// `owner` matches no subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub org_id: String,
    pub resource_type: String,
    #[serde(default)]
    pub acl_user_list: BTreeMap<String, Vec<Permission>>,
    #[serde(default)]
    pub acl_group_list: BTreeMap<String, Vec<Permission>>,
}

impl Object {
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn in_org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = org_id.into();
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    #[must_use]
    pub fn with_acl_user(mut self, user_id: impl Into<String>, permissions: Vec<Permission>) -> Self {
        self.acl_user_list.insert(user_id.into(), permissions);
        self
    }

    #[must_use]
    pub fn with_acl_group(
        mut self,
        group_id: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> Self {
        self.acl_group_list.insert(group_id.into(), permissions);
        self
    }

    #[must_use]
    pub fn is_owned_by(&self, subject_id: &str) -> bool {
        !self.owner.is_empty() && self.owner == subject_id
    }

    /// A well-formed object has a resource type and well-formed ACL entries.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.resource_type.is_empty()
            && self
                .acl_user_list
                .values()
                .chain(self.acl_group_list.values())
                .flatten()
                .all(Permission::is_well_formed)
    }
}

/// Anything that can be authorized as an [`Object`].
pub trait AsObject {
    fn rbac_object(&self) -> Object;
}

impl AsObject for Object {
    fn rbac_object(&self) -> Object {
        self.clone()
    }
}

/// Outcome of a single authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    #[inline]
    #[must_use]
    pub fn is_allow(self) -> bool {
        self == Self::Allow
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::Deny }
    }
}
