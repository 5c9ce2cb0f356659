//! Public API trait for the `rbac` gateway.

use async_trait::async_trait;
use authz_scope::AccessScope;

use crate::error::AuthzError;
use crate::models::{Action, Decision, Object, Subject};
use crate::pep::compile_to_access_scope;
use crate::predicate::Predicate;

/// Public API trait for the `rbac` gateway.
///
/// Registered by the `rbac` module and consumed by modules acting as PEPs:
///
/// ```ignore
/// let authz = hub.get::<dyn AuthzGatewayClient>()?;
///
/// authz.authorize(&subject, &Action::UPDATE, &object).await?;
/// ```
#[async_trait]
pub trait AuthzGatewayClient: Send + Sync {
    /// Decide a single `(subject, action, object)` request.
    ///
    /// # Errors
    ///
    /// - `InputTranslationFailed` if the subject or object cannot be translated
    /// - `EvaluatorUnavailable` / `EvaluatorRejectedInput` if the evaluator fails
    async fn decide(
        &self,
        subject: &Subject,
        action: &Action,
        object: &Object,
    ) -> Result<Decision, AuthzError>;

    /// Like [`decide`](Self::decide), but a deny becomes `Unauthorized`.
    ///
    /// # Errors
    ///
    /// Same as [`decide`](Self::decide), plus `Unauthorized` on deny.
    async fn authorize(
        &self,
        subject: &Subject,
        action: &Action,
        object: &Object,
    ) -> Result<(), AuthzError>;

    /// Derive the listing predicate for one resource type.
    ///
    /// # Errors
    ///
    /// Same as [`decide`](Self::decide).
    async fn scope(
        &self,
        subject: &Subject,
        action: &Action,
        resource_type: &str,
    ) -> Result<Predicate, AuthzError>;

    /// Derive the listing predicate and compile it for storage.
    ///
    /// # Errors
    ///
    /// Same as [`scope`](Self::scope).
    async fn access_scope(
        &self,
        subject: &Subject,
        action: &Action,
        resource_type: &str,
    ) -> Result<AccessScope, AuthzError> {
        let predicate = self.scope(subject, action, resource_type).await?;
        Ok(compile_to_access_scope(&predicate))
    }
}
