//! Entity translation into evaluator input values.
//!
//! Roles, scopes, permissions, actions and objects translate through
//! [`ToValue`]. Subjects need role and scope expansion, so their translation
//! goes through the [`SubjectCache`].

use std::sync::Arc;

use rbac_sdk::{
    Action, Object, Permission, Role, RoleRegistry, Scope, Subject, ToValue, TranslateError,
    Value, partial_object_value,
};

use super::cache::{CacheKey, SubjectCache};

#[must_use]
pub fn translate_action(action: &Action) -> Value {
    action.to_value()
}

#[must_use]
pub fn translate_permission(permission: &Permission) -> Value {
    permission.to_value()
}

/// Returns the role's cached translation when it carries one.
#[must_use]
pub fn translate_role(role: &Role) -> Value {
    role.to_value()
}

#[must_use]
pub fn translate_scope(scope: &Scope) -> Value {
    scope.to_value()
}

pub(crate) fn check_object(object: &Object) -> Result<(), TranslateError> {
    if object.is_well_formed() {
        Ok(())
    } else {
        Err(TranslateError::MalformedObject(format!(
            "object '{}' of type '{}'",
            object.id, object.resource_type
        )))
    }
}

/// # Errors
///
/// Returns [`TranslateError::MalformedObject`] if the object has no resource
/// type or an ACL entry with an empty resource type or action.
pub fn translate_object(object: &Object) -> Result<Value, TranslateError> {
    check_object(object)?;
    Ok(object.to_value())
}

/// Cache-assisted subject translation against one role registry.
#[derive(Clone)]
pub struct Translator {
    registry: Arc<dyn RoleRegistry>,
    cache: Arc<SubjectCache>,
}

impl Translator {
    #[must_use]
    pub fn new(registry: Arc<dyn RoleRegistry>, cache: Arc<SubjectCache>) -> Self {
        Self { registry, cache }
    }

    #[must_use]
    pub fn cache(&self) -> &SubjectCache {
        &self.cache
    }

    /// Translate a subject into `{id, roles, scope, groups}`.
    ///
    /// # Errors
    ///
    /// - `RoleExpansionFailed` if a role is unknown or malformed
    /// - `ScopeExpansionFailed` if the scope is unknown or malformed
    pub fn translate_subject(&self, subject: &Subject) -> Result<Value, TranslateError> {
        let key = CacheKey::for_subject(&self.registry.fingerprint(), subject);
        if let Some(key) = &key
            && let Some(cached) = self.cache.get(key)
        {
            tracing::trace!(subject_id = %subject.id, ?key, "subject cache hit");
            return Ok(cached);
        }

        let roles = subject
            .roles
            .expand(self.registry.as_ref())
            .map_err(TranslateError::RoleExpansionFailed)?;
        let scope = subject
            .scope
            .expand(self.registry.as_ref())
            .map_err(TranslateError::ScopeExpansionFailed)?;

        let value = Value::object([
            ("id", Value::string(subject.id.as_str())),
            ("roles", Value::array(roles.iter().map(ToValue::to_value))),
            ("scope", scope.to_value()),
            ("groups", Value::strings(&subject.groups)),
        ]);

        if let Some(key) = key {
            tracing::trace!(subject_id = %subject.id, ?key, "subject cache fill");
            self.cache.insert(key, value.clone());
        }
        Ok(value)
    }

    /// Full evaluation input: `{subject, action, object}`.
    ///
    /// # Errors
    ///
    /// Propagates subject and object translation errors.
    pub fn input_value(
        &self,
        subject: &Subject,
        action: &Action,
        object: &Object,
    ) -> Result<Value, TranslateError> {
        Ok(Value::object([
            ("subject", self.translate_subject(subject)?),
            ("action", translate_action(action)),
            ("object", translate_object(object)?),
        ]))
    }

    /// Partial evaluation input: `{subject, action, object: {type}}`.
    ///
    /// # Errors
    ///
    /// Propagates subject translation errors, and rejects an empty resource type.
    pub fn partial_input_value(
        &self,
        subject: &Subject,
        action: &Action,
        resource_type: &str,
    ) -> Result<Value, TranslateError> {
        if resource_type.is_empty() {
            return Err(TranslateError::MalformedObject(
                "empty resource type".to_owned(),
            ));
        }
        Ok(Value::object([
            ("subject", self.translate_subject(subject)?),
            ("action", translate_action(action)),
            ("object", partial_object_value(resource_type)),
        ]))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::SubjectCacheConfig;
    use crate::domain::builtin::StaticRoleRegistry;
    use rbac_sdk::{ExpandError, ScopeName, ScopeRef, resources};

    fn translator() -> Translator {
        Translator::new(
            Arc::new(StaticRoleRegistry::new()),
            Arc::new(SubjectCache::new(&SubjectCacheConfig::default())),
        )
    }

    fn json(v: &Value) -> serde_json::Value {
        serde_json::Value::from(v)
    }

    #[test]
    fn subject_shape() {
        let t = translator();
        let subject = Subject::new("u1").with_role_names(["auditor"]).with_groups(["g1"]);
        let v = json(&t.translate_subject(&subject).unwrap());

        assert_eq!(v["id"], "u1");
        assert_eq!(v["groups"], serde_json::json!(["g1"]));
        assert_eq!(v["roles"][0]["site"][0]["resource_type"], "audit_log");
        assert_eq!(v["scope"]["allow_list"], serde_json::json!([]));
        assert_eq!(v["scope"]["site"][0]["action"], "*");
    }

    #[test]
    fn second_translation_hits_the_cache() {
        let t = translator();
        let subject = Subject::new("u1").with_role_names(["member"]);
        let first = t.translate_subject(&subject).unwrap();
        let second = t.translate_subject(&subject).unwrap();

        assert_eq!(first, second);
        let stats = t.cache().stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn expansion_errors_are_typed_and_not_cached() {
        let t = translator();
        let ghost = Subject::new("u1").with_role_names(["ghost"]);
        assert_eq!(
            t.translate_subject(&ghost),
            Err(TranslateError::RoleExpansionFailed(ExpandError::UnknownRole(
                "ghost".to_owned()
            )))
        );

        let bad_scope =
            Subject::new("u1").with_scope(ScopeRef::Builtin(ScopeName::new("everything")));
        assert_eq!(
            t.translate_subject(&bad_scope),
            Err(TranslateError::ScopeExpansionFailed(ExpandError::UnknownScope(
                "everything".to_owned()
            )))
        );

        t.cache().run_pending_tasks();
        assert_eq!(t.cache().stats().entries, 0);
    }

    #[test]
    fn malformed_inline_role_fails_expansion() {
        let t = translator();
        let subject =
            Subject::new("u1").with_roles(vec![Role::new("r").with_site(vec![Permission::allow(
                resources::WORKSPACE,
                Action::new(""),
            )])]);
        assert!(matches!(
            t.translate_subject(&subject),
            Err(TranslateError::RoleExpansionFailed(ExpandError::InvalidRole(_)))
        ));
    }

    #[test]
    fn concurrent_translations_agree_with_sequential_ones() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 25;

        let subjects = [
            Subject::new("u1").with_role_names(["member"]),
            Subject::new("u1").with_role_names(["owner", "auditor"]),
            Subject::new("u2")
                .with_role_names(["organization-admin:o1"])
                .with_groups(["g1"]),
            Subject::new("u3").with_roles(vec![Role::new("r").with_user(vec![
                Permission::allow(resources::WORKSPACE, Action::WILDCARD),
            ])]),
        ];
        let sequential = translator();
        let expected: Vec<_> = subjects
            .iter()
            .map(|s| sequential.translate_subject(s).unwrap())
            .collect();

        let shared = translator();
        std::thread::scope(|scope| {
            for offset in 0..THREADS {
                let (shared, subjects, expected) = (&shared, &subjects, &expected);
                scope.spawn(move || {
                    for round in 0..ROUNDS {
                        let i = (offset + round) % subjects.len();
                        assert_eq!(shared.translate_subject(&subjects[i]).unwrap(), expected[i]);
                    }
                });
            }
        });

        let distinct = u64::try_from(subjects.len()).unwrap();
        let stats = shared.cache().stats();
        assert_eq!(stats.hits + stats.misses, u64::try_from(THREADS * ROUNDS).unwrap());
        assert!(stats.misses >= distinct);
        shared.cache().run_pending_tasks();
        assert_eq!(shared.cache().stats().entries, distinct);
    }

    #[test]
    fn input_values() {
        let t = translator();
        let subject = Subject::new("u1");
        let object = Object::new(resources::WORKSPACE).with_id("w1");

        let full = json(&t.input_value(&subject, &Action::READ, &object).unwrap());
        assert_eq!(full["action"], "read");
        assert_eq!(full["object"]["id"], "w1");

        let partial = json(
            &t.partial_input_value(&subject, &Action::READ, resources::WORKSPACE)
                .unwrap(),
        );
        assert_eq!(partial["object"], serde_json::json!({"type": "workspace"}));
    }

    #[test]
    fn malformed_objects_are_rejected() {
        let t = translator();
        let subject = Subject::new("u1");
        assert!(matches!(
            t.input_value(&subject, &Action::READ, &Object::new("")),
            Err(TranslateError::MalformedObject(_))
        ));
        let bad_acl = Object::new(resources::WORKSPACE)
            .with_acl_user("u1", vec![Permission::allow("", Action::READ)]);
        assert!(translate_object(&bad_acl).is_err());
        assert!(t.partial_input_value(&subject, &Action::READ, "").is_err());
    }
}
