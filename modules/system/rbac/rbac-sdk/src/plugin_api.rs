//! Plugin API for rule evaluators.

use crate::error::EvaluatorError;
use crate::predicate::Predicate;
use crate::value::Value;

/// A rule evaluator executes the permission rules over translated input.
///
/// Full evaluation receives `{subject, action, object}`; partial evaluation
/// receives `{subject, action, object: {type}}` and returns a [`Predicate`]
/// over the unknown object.
///
/// Evaluation is synchronous and CPU-bound; implementations must be safe to
/// call from many threads at once.
pub trait RuleEvaluator: Send + Sync {
    /// Decide whether the input is allowed.
    ///
    /// # Errors
    ///
    /// - `MalformedInput` if the input does not have the expected shape
    /// - `Unavailable` if the evaluator cannot answer
    fn evaluate(&self, input: &Value) -> Result<bool, EvaluatorError>;

    /// Derive a predicate over objects of the seeded resource type.
    ///
    /// # Errors
    ///
    /// Same as [`RuleEvaluator::evaluate`].
    fn partial(&self, input: &Value) -> Result<Predicate, EvaluatorError>;
}
