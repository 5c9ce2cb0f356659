//! Client implementation for the static rbac plugin.

use rbac_sdk::{EvaluatorError, Predicate, RuleEvaluator, Value};

use super::service::Service;

impl RuleEvaluator for Service {
    fn evaluate(&self, input: &Value) -> Result<bool, EvaluatorError> {
        Service::evaluate(self, input)
    }

    fn partial(&self, input: &Value) -> Result<Predicate, EvaluatorError> {
        Service::partial(self, input)
    }
}
