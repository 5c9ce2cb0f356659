//! Decision engine.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use rbac_sdk::{Action, AsObject, Decision, Object, RoleRegistry, RuleEvaluator, Subject};

use super::cache::{CacheStats, SubjectCache};
use super::error::DomainError;
use super::scoping::PreparedAuthorizer;
use super::translator::{Translator, check_object};
use crate::config::RbacConfig;

/// Translates requests and asks the rule evaluator for decisions.
///
/// Every failure is returned as an error; callers must treat any `Err` as
/// a deny.
#[derive(Clone)]
pub struct AuthzEngine {
    pub(super) evaluator: Arc<dyn RuleEvaluator>,
    pub(super) translator: Translator,
}

impl AuthzEngine {
    /// Engine backed by the process-wide subject cache.
    #[must_use]
    pub fn new(evaluator: Arc<dyn RuleEvaluator>, registry: Arc<dyn RoleRegistry>) -> Self {
        Self::with_cache(evaluator, registry, SubjectCache::global())
    }

    #[must_use]
    pub fn with_cache(
        evaluator: Arc<dyn RuleEvaluator>,
        registry: Arc<dyn RoleRegistry>,
        cache: Arc<SubjectCache>,
    ) -> Self {
        Self {
            evaluator,
            translator: Translator::new(registry, cache),
        }
    }

    /// Install the process-wide cache with the configured bounds, then build
    /// an engine on top of it.
    #[must_use]
    pub fn from_config(
        cfg: &RbacConfig,
        evaluator: Arc<dyn RuleEvaluator>,
        registry: Arc<dyn RoleRegistry>,
    ) -> Self {
        let installed = SubjectCache::install_global(&cfg.subject_cache);
        tracing::info!(
            installed,
            capacity = cfg.subject_cache.capacity,
            ttl_secs = cfg.subject_cache.ttl_secs,
            "rbac engine initialized"
        );
        Self::new(evaluator, registry)
    }

    #[must_use]
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.translator.cache().stats()
    }

    /// Decide a single request.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Translate`] if the subject or object cannot be translated
    /// - [`DomainError::Evaluator`] if the evaluator fails
    #[tracing::instrument(
        skip_all,
        fields(subject_id = %subject.id, action = %action, resource_type = %object.resource_type)
    )]
    pub fn decide(
        &self,
        subject: &Subject,
        action: &Action,
        object: &Object,
    ) -> Result<Decision, DomainError> {
        let input = self.translator.input_value(subject, action, object)?;
        let allowed = self.evaluator.evaluate(&input)?;
        tracing::debug!(allowed, object_id = %object.id, "authorization decision");
        Ok(Decision::from(allowed))
    }

    /// # Errors
    ///
    /// Same as [`decide`](Self::decide), plus [`DomainError::Denied`] on deny.
    pub fn authorize(
        &self,
        subject: &Subject,
        action: &Action,
        object: &Object,
    ) -> Result<(), DomainError> {
        if self.decide(subject, action, object)?.is_allow() {
            return Ok(());
        }
        Err(DomainError::Denied {
            subject_id: subject.id.clone(),
            action: action.clone(),
            resource_type: object.resource_type.clone(),
        })
    }

    /// Keep the items the subject may act on.
    ///
    /// One predicate is derived per resource type present, so items are
    /// checked without translating each of them.
    ///
    /// # Errors
    ///
    /// Fails if any item is malformed or a predicate cannot be derived.
    #[tracing::instrument(skip_all, fields(subject_id = %subject.id, action = %action))]
    pub fn filter<O: AsObject>(
        &self,
        subject: &Subject,
        action: &Action,
        items: Vec<O>,
    ) -> Result<Vec<O>, DomainError> {
        let total = items.len();
        let mut prepared: HashMap<String, PreparedAuthorizer> = HashMap::new();
        let mut kept = Vec::with_capacity(total);

        for item in items {
            let object = item.rbac_object();
            check_object(&object)?;
            let authorizer = match prepared.entry(object.resource_type.clone()) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(self.prepare(subject, action, &object.resource_type)?),
            };
            if authorizer.allows(&object) {
                kept.push(item);
            }
        }

        tracing::debug!(total, kept = kept.len(), "filtered objects");
        Ok(kept)
    }
}
