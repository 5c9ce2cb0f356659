//! Borrowed views over the evaluator input value.
//!
//! Parsing only checks shape; rule evaluation lives in `service`.

use std::collections::BTreeMap;

use authz_scope::pattern_matches;
use rbac_sdk::{EvaluatorError, Value};

fn malformed(what: &str) -> EvaluatorError {
    EvaluatorError::MalformedInput(what.to_owned())
}

fn field<'v>(value: &'v Value, key: &str) -> Result<&'v Value, EvaluatorError> {
    value
        .get(key)
        .ok_or_else(|| malformed(&format!("missing field `{key}`")))
}

fn str_field<'v>(value: &'v Value, key: &str) -> Result<&'v str, EvaluatorError> {
    field(value, key)?
        .as_str()
        .ok_or_else(|| malformed(&format!("`{key}` is not a string")))
}

fn array_field<'v>(value: &'v Value, key: &str) -> Result<&'v [Value], EvaluatorError> {
    field(value, key)?
        .as_array()
        .ok_or_else(|| malformed(&format!("`{key}` is not an array")))
}

fn map_field<'v>(value: &'v Value, key: &str) -> Result<&'v BTreeMap<String, Value>, EvaluatorError> {
    field(value, key)?
        .as_object()
        .ok_or_else(|| malformed(&format!("`{key}` is not an object")))
}

fn strings(items: &[Value], key: &str) -> Result<Vec<String>, EvaluatorError> {
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| malformed(&format!("`{key}` holds a non-string entry")))
        })
        .collect()
}

/// The `(resource type, action)` a permission entry must apply to.
#[derive(Debug, Clone, Copy)]
pub(super) struct Target<'a> {
    pub resource_type: &'a str,
    pub action: &'a str,
}

/// Grants and denies found in a set of permission entries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct Outcome {
    pub granted: bool,
    pub denied: bool,
}

impl Outcome {
    /// Fold a permission list into the outcome.
    pub fn absorb(&mut self, permissions: &[Value], target: Target<'_>) -> Result<(), EvaluatorError> {
        for permission in permissions {
            let resource_type = str_field(permission, "resource_type")?;
            let action = str_field(permission, "action")?;
            let negate = field(permission, "negate")?
                .as_bool()
                .ok_or_else(|| malformed("`negate` is not a boolean"))?;
            if resource_type.is_empty() || action.is_empty() {
                return Err(malformed("permission with empty resource type or action"));
            }
            if !pattern_matches(resource_type, target.resource_type)
                || !pattern_matches(action, target.action)
            {
                continue;
            }
            if negate {
                self.denied = true;
            } else {
                self.granted = true;
            }
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Outcome) {
        self.granted |= other.granted;
        self.denied |= other.denied;
    }

    pub fn of(permissions: &[Value], target: Target<'_>) -> Result<Outcome, EvaluatorError> {
        let mut outcome = Outcome::default();
        outcome.absorb(permissions, target)?;
        Ok(outcome)
    }
}

/// A translated role: `{site, org, user}`.
#[derive(Debug, Clone, Copy)]
pub(super) struct RoleView<'v> {
    pub site: &'v [Value],
    pub org: &'v BTreeMap<String, Value>,
    pub user: &'v [Value],
}

impl<'v> RoleView<'v> {
    fn parse(value: &'v Value) -> Result<Self, EvaluatorError> {
        Ok(Self {
            site: array_field(value, "site")?,
            org: map_field(value, "org")?,
            user: array_field(value, "user")?,
        })
    }

    /// Org-level permissions for one organization.
    pub fn org_permissions(&self, org_id: &str) -> Result<&'v [Value], EvaluatorError> {
        match self.org.get(org_id) {
            Some(v) => v
                .as_array()
                .ok_or_else(|| malformed("org permissions are not an array")),
            None => Ok(&[]),
        }
    }
}

/// A translated subject: `{id, roles, scope, groups}`.
#[derive(Debug)]
pub(super) struct SubjectView<'v> {
    pub id: &'v str,
    pub roles: Vec<RoleView<'v>>,
    pub scope_role: RoleView<'v>,
    pub allow_list: Vec<String>,
    pub groups: Vec<String>,
}

impl<'v> SubjectView<'v> {
    fn parse(value: &'v Value) -> Result<Self, EvaluatorError> {
        let roles = array_field(value, "roles")?
            .iter()
            .map(RoleView::parse)
            .collect::<Result<Vec<_>, _>>()?;
        let scope = field(value, "scope")?;
        Ok(Self {
            id: str_field(value, "id")?,
            roles,
            scope_role: RoleView::parse(scope)?,
            allow_list: strings(array_field(scope, "allow_list")?, "allow_list")?,
            groups: strings(array_field(value, "groups")?, "groups")?,
        })
    }
}

/// A translated object: `{id, owner, org_owner, type, acl_user_list, acl_group_list}`.
#[derive(Debug)]
pub(super) struct ObjectView<'v> {
    pub id: &'v str,
    pub owner: &'v str,
    pub org_owner: &'v str,
    pub resource_type: &'v str,
    pub acl_user_list: &'v BTreeMap<String, Value>,
    pub acl_group_list: &'v BTreeMap<String, Value>,
}

impl<'v> ObjectView<'v> {
    fn parse(value: &'v Value) -> Result<Self, EvaluatorError> {
        Ok(Self {
            id: str_field(value, "id")?,
            owner: str_field(value, "owner")?,
            org_owner: str_field(value, "org_owner")?,
            resource_type: str_field(value, "type")?,
            acl_user_list: map_field(value, "acl_user_list")?,
            acl_group_list: map_field(value, "acl_group_list")?,
        })
    }
}

/// ACL entries for one principal.
pub(super) fn acl_permissions<'v>(
    acl: &'v BTreeMap<String, Value>,
    principal: &str,
) -> Result<&'v [Value], EvaluatorError> {
    match acl.get(principal) {
        Some(v) => v
            .as_array()
            .ok_or_else(|| malformed("ACL permissions are not an array")),
        None => Ok(&[]),
    }
}

/// Full evaluation input: `{subject, action, object}`.
#[derive(Debug)]
pub(super) struct FullInput<'v> {
    pub subject: SubjectView<'v>,
    pub action: &'v str,
    pub object: ObjectView<'v>,
}

impl<'v> FullInput<'v> {
    pub fn parse(input: &'v Value) -> Result<Self, EvaluatorError> {
        Ok(Self {
            subject: SubjectView::parse(field(input, "subject")?)?,
            action: str_field(input, "action")?,
            object: ObjectView::parse(field(input, "object")?)?,
        })
    }
}

/// Partial evaluation input: `{subject, action, object: {type}}`.
#[derive(Debug)]
pub(super) struct PartialInput<'v> {
    pub subject: SubjectView<'v>,
    pub action: &'v str,
    pub resource_type: &'v str,
}

impl<'v> PartialInput<'v> {
    pub fn parse(input: &'v Value) -> Result<Self, EvaluatorError> {
        Ok(Self {
            subject: SubjectView::parse(field(input, "subject")?)?,
            action: str_field(input, "action")?,
            resource_type: str_field(field(input, "object")?, "type")?,
        })
    }
}
