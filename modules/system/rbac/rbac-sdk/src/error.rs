//! Error types for the `rbac` module.
//!
//! Every error path is fail-closed: callers must treat any `Err` as a deny.

use crate::models::Action;

/// Failure to resolve a subject's roles or scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// A role name has no definition.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// A built-in scope name has no definition.
    #[error("unknown scope: {0}")]
    UnknownScope(String),

    /// A role is unusable: a permission has an empty resource type or
    /// action, or the name is reserved.
    #[error("invalid role: {0}")]
    InvalidRole(String),
}

/// Failure to translate an entity into its evaluable value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("expanding subject roles: {0}")]
    RoleExpansionFailed(#[source] ExpandError),

    #[error("expanding subject scope: {0}")]
    ScopeExpansionFailed(#[source] ExpandError),

    #[error("malformed object: {0}")]
    MalformedObject(String),
}

/// Failure reported by a [`RuleEvaluator`](crate::RuleEvaluator).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluatorError {
    /// The evaluator could not produce an answer.
    #[error("rule evaluator unavailable: {0}")]
    Unavailable(String),

    /// The input value does not have the expected shape.
    #[error("malformed evaluator input: {0}")]
    MalformedInput(String),
}

/// Errors surfaced by the public `rbac` API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("input translation failed: {0}")]
    InputTranslationFailed(#[from] TranslateError),

    #[error("evaluator unavailable: {0}")]
    EvaluatorUnavailable(String),

    #[error("evaluator rejected input: {0}")]
    EvaluatorRejectedInput(String),

    /// The decision was deny.
    #[error("subject {subject_id} may not {action} {resource_type}")]
    Unauthorized {
        subject_id: String,
        action: Action,
        resource_type: String,
    },
}

impl AuthzError {
    /// Returns `true` if the request failed because a role name is undefined.
    #[must_use]
    pub fn is_unknown_role(&self) -> bool {
        matches!(
            self,
            Self::InputTranslationFailed(TranslateError::RoleExpansionFailed(
                ExpandError::UnknownRole(_)
            ))
        )
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl From<EvaluatorError> for AuthzError {
    fn from(e: EvaluatorError) -> Self {
        match e {
            EvaluatorError::Unavailable(msg) => Self::EvaluatorUnavailable(msg),
            EvaluatorError::MalformedInput(msg) => Self::EvaluatorRejectedInput(msg),
        }
    }
}
