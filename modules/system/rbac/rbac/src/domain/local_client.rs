//! Local (in-process) client for the rbac gateway.

use std::sync::Arc;

use async_trait::async_trait;
use rbac_sdk::{Action, AuthzError, AuthzGatewayClient, Decision, Object, Predicate, Subject};

use super::{AuthzEngine, DomainError};

/// Local client wrapping the decision engine.
pub struct AuthzGwLocalClient {
    svc: Arc<AuthzEngine>,
}

impl AuthzGwLocalClient {
    #[must_use]
    pub fn new(svc: Arc<AuthzEngine>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> AuthzError {
    if e.is_denial() {
        tracing::debug!(operation = op, error = %e, "rbac gateway denied request");
    } else {
        tracing::error!(operation = op, error = ?e, "rbac gateway call failed");
    }
    e.into()
}

#[async_trait]
impl AuthzGatewayClient for AuthzGwLocalClient {
    async fn decide(
        &self,
        subject: &Subject,
        action: &Action,
        object: &Object,
    ) -> Result<Decision, AuthzError> {
        self.svc
            .decide(subject, action, object)
            .map_err(|e| log_and_convert("decide", e))
    }

    async fn authorize(
        &self,
        subject: &Subject,
        action: &Action,
        object: &Object,
    ) -> Result<(), AuthzError> {
        self.svc
            .authorize(subject, action, object)
            .map_err(|e| log_and_convert("authorize", e))
    }

    async fn scope(
        &self,
        subject: &Subject,
        action: &Action,
        resource_type: &str,
    ) -> Result<Predicate, AuthzError> {
        self.svc
            .scope(subject, action, resource_type)
            .map_err(|e| log_and_convert("scope", e))
    }
}
