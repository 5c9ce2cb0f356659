use rbac_sdk::{Action, AuthzError, EvaluatorError, TranslateError};

/// Errors raised by the engine before conversion into [`AuthzError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),

    #[error("subject {subject_id} may not {action} {resource_type}")]
    Denied {
        subject_id: String,
        action: Action,
        resource_type: String,
    },
}

impl DomainError {
    /// A deny decision rather than a failure.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

impl From<DomainError> for AuthzError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Translate(e) => AuthzError::InputTranslationFailed(e),
            DomainError::Evaluator(e) => e.into(),
            DomainError::Denied {
                subject_id,
                action,
                resource_type,
            } => AuthzError::Unauthorized {
                subject_id,
                action,
                resource_type,
            },
        }
    }
}
