//! Entity → [`Value`] translation for roles, scopes, permissions, actions and objects.
//!
//! These translations are total. Subject translation needs role expansion
//! and caching, and lives in the `rbac` module.

use std::collections::BTreeMap;

use crate::models::{Action, Object, Permission, Role, Scope};
use crate::value::Value;

/// Conversion into the evaluable value tree.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl ToValue for Action {
    fn to_value(&self) -> Value {
        Value::string(self.as_str())
    }
}

impl ToValue for Permission {
    fn to_value(&self) -> Value {
        Value::object([
            ("negate", Value::Bool(self.negate)),
            ("resource_type", Value::string(self.resource_type.as_str())),
            ("action", self.action.to_value()),
        ])
    }
}

impl ToValue for Role {
    /// The precomputed translation when present, otherwise a fresh one.
    fn to_value(&self) -> Value {
        match self.cached_value() {
            Some(cached) => cached.clone(),
            None => role_value(self),
        }
    }
}

impl ToValue for Scope {
    fn to_value(&self) -> Value {
        self.role
            .to_value()
            .with_entry("allow_list", Value::strings(&self.allow_id_list))
    }
}

impl ToValue for Object {
    fn to_value(&self) -> Value {
        Value::object([
            ("id", Value::string(self.id.as_str())),
            ("owner", Value::string(self.owner.as_str())),
            ("org_owner", Value::string(self.org_id.as_str())),
            ("type", Value::string(self.resource_type.as_str())),
            ("acl_user_list", permission_map(&self.acl_user_list)),
            ("acl_group_list", permission_map(&self.acl_group_list)),
        ])
    }
}

/// The object seed used for partial evaluation: only the resource type is known.
#[must_use]
pub fn partial_object_value(resource_type: &str) -> Value {
    Value::object([("type", Value::string(resource_type))])
}

/// Translate a role from its fields, ignoring any cached value.
pub(crate) fn role_value(role: &Role) -> Value {
    Value::object([
        ("site", permission_list(role.site())),
        ("org", permission_map(role.org())),
        ("user", permission_list(role.user())),
    ])
}

pub(crate) fn permission_list(permissions: &[Permission]) -> Value {
    Value::array(permissions.iter().map(ToValue::to_value))
}

fn permission_map(map: &BTreeMap<String, Vec<Permission>>) -> Value {
    Value::object(map.iter().map(|(k, v)| (k.as_str(), permission_list(v))))
}
