//! Partial evaluation for listing queries.
//!
//! [`AuthzEngine::scope`] derives a [`Predicate`] for a fixed subject, action
//! and resource type. [`PreparedAuthorizer`] pairs it with its compiled
//! [`AccessScope`] so a listing can both push the scope into storage and
//! check individual objects without re-translating the subject.

use authz_scope::AccessScope;
use rbac_sdk::pep::compile_to_access_scope;
use rbac_sdk::{Action, Object, Predicate, Subject};

use super::error::DomainError;
use super::service::AuthzEngine;

impl AuthzEngine {
    /// Derive the listing predicate for one resource type.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Translate`] if the subject cannot be translated or
    ///   the resource type is empty
    /// - [`DomainError::Evaluator`] if the evaluator fails
    #[tracing::instrument(
        skip_all,
        fields(subject_id = %subject.id, action = %action, resource_type = %resource_type)
    )]
    pub fn scope(
        &self,
        subject: &Subject,
        action: &Action,
        resource_type: &str,
    ) -> Result<Predicate, DomainError> {
        let input = self
            .translator
            .partial_input_value(subject, action, resource_type)?;
        let predicate = self.evaluator.partial(&input)?;
        tracing::debug!(
            deny_all = predicate.is_deny_all(),
            acl_only = predicate.acl_only(),
            "derived listing predicate"
        );
        Ok(predicate)
    }

    /// Derive and compile a predicate for reuse across one listing.
    ///
    /// # Errors
    ///
    /// Same as [`scope`](Self::scope).
    pub fn prepare(
        &self,
        subject: &Subject,
        action: &Action,
        resource_type: &str,
    ) -> Result<PreparedAuthorizer, DomainError> {
        self.scope(subject, action, resource_type)
            .map(PreparedAuthorizer::new)
    }
}

/// A predicate together with its storage scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedAuthorizer {
    predicate: Predicate,
    scope: AccessScope,
}

impl PreparedAuthorizer {
    #[must_use]
    pub fn new(predicate: Predicate) -> Self {
        let scope = compile_to_access_scope(&predicate);
        Self { predicate, scope }
    }

    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Scope to AND into the storage query.
    #[must_use]
    pub fn access_scope(&self) -> &AccessScope {
        &self.scope
    }

    /// Whether the subject may act on this object. Agrees with a full
    /// decision for every object of the prepared resource type.
    #[must_use]
    pub fn allows(&self, object: &Object) -> bool {
        self.predicate.matches(object)
    }

    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        self.predicate.is_deny_all()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SubjectCacheConfig;
    use crate::domain::builtin::{StaticRoleRegistry, organization_admin};
    use crate::domain::cache::SubjectCache;
    use authz_scope::properties;
    use rbac_sdk::{Permission, Role, Scope, ScopeRef, TranslateError, resources};

    fn engine() -> AuthzEngine {
        AuthzEngine::with_cache(
            Arc::new(static_rbac_plugin::Service::new()),
            Arc::new(StaticRoleRegistry::new()),
            Arc::new(SubjectCache::new(&SubjectCacheConfig::default())),
        )
    }

    #[test]
    fn site_grant_is_unconstrained() {
        let subject = Subject::new("u1").with_role_names(["owner"]);
        let prepared = engine()
            .prepare(&subject, &Action::READ, resources::WORKSPACE)
            .unwrap();
        assert!(prepared.predicate().allow_site);
        assert!(!prepared.is_deny_all());
        assert!(prepared.access_scope().requires_acl_check());
        assert!(prepared.allows(&Object::new(resources::WORKSPACE).with_id("anything")));
    }

    #[test]
    fn org_admin_scope_is_limited_to_the_org() {
        let subject = Subject::new("u1").with_roles(vec![organization_admin("o1")]);
        let prepared = engine()
            .prepare(&subject, &Action::UPDATE, resources::TEMPLATE)
            .unwrap();

        assert!(prepared.access_scope().contains_value(properties::ORG_ID, "o1"));
        assert!(prepared.allows(&Object::new(resources::TEMPLATE).in_org("o1")));
        assert!(!prepared.allows(&Object::new(resources::TEMPLATE).in_org("o2")));
    }

    #[test]
    fn site_negate_is_deny_all() {
        let subject = Subject::new("u1").with_roles(vec![
            Role::new("admin").with_site(vec![Permission::allow(resources::FILE, Action::WILDCARD)]),
            Role::new("no-files").with_site(vec![Permission::deny(resources::FILE, Action::DELETE)]),
        ]);
        let prepared = engine()
            .prepare(&subject, &Action::DELETE, resources::FILE)
            .unwrap();
        assert!(prepared.is_deny_all());
        assert!(prepared.access_scope().is_deny_all());
        let shared = Object::new(resources::FILE)
            .with_acl_user("u1", vec![Permission::allow(resources::FILE, Action::DELETE)]);
        assert!(!prepared.allows(&shared));
    }

    #[test]
    fn allow_list_restricts_ids() {
        let subject = Subject::new("u1")
            .with_role_names(["owner"])
            .with_scope(ScopeRef::Custom(
                Scope::new(Role::new("pat").with_site(vec![Permission::allow(
                    resources::WORKSPACE,
                    Action::READ,
                )]))
                .with_allow_ids(["w1"]),
            ));
        let prepared = engine()
            .prepare(&subject, &Action::READ, resources::WORKSPACE)
            .unwrap();

        assert!(prepared.access_scope().contains_value(properties::RESOURCE_ID, "w1"));
        assert!(prepared.allows(&Object::new(resources::WORKSPACE).with_id("w1")));
        assert!(!prepared.allows(&Object::new(resources::WORKSPACE).with_id("w2")));
    }

    #[test]
    fn empty_resource_type_is_rejected() {
        let subject = Subject::new("u1");
        assert!(matches!(
            engine().scope(&subject, &Action::READ, ""),
            Err(DomainError::Translate(TranslateError::MalformedObject(_)))
        ));
    }
}
