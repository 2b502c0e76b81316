//! Failure handling strategies

use tracing::warn;

use crate::errors::FlowError;
use crate::types::FailureStrategy;

/// Decides whether a failed step ends the run.
pub trait FailureHandler: Send + Sync {
    fn handle_failure(
        &self,
        step_id: &str,
        strategy: FailureStrategy,
        error: &FlowError,
    ) -> FailureHandlerResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureHandlerResult {
    /// Abort the entire flow
    Abort(String),

    /// Continue to next step
    Continue(String),
}

/// Applies the step strategy, except that assertion failures and
/// interruptions always abort.
#[derive(Debug, Default)]
pub struct DefaultFailureHandler;

impl DefaultFailureHandler {
    pub fn new() -> Self {
        Self
    }
}

impl FailureHandler for DefaultFailureHandler {
    fn handle_failure(
        &self,
        step_id: &str,
        strategy: FailureStrategy,
        error: &FlowError,
    ) -> FailureHandlerResult {
        if error.is_fatal() {
            warn!(step_id, error = %error, "fatal step failure, aborting flow");
            return FailureHandlerResult::Abort(error.to_string());
        }
        match strategy {
            FailureStrategy::Abort => {
                warn!(step_id, error = %error, "step failed, aborting flow");
                FailureHandlerResult::Abort(error.to_string())
            }
            FailureStrategy::Continue => {
                warn!(step_id, error = %error, "step failed, continuing");
                FailureHandlerResult::Continue(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_gate::GateError;
    use action_primitives::ActionError;

    #[test]
    fn continue_strategy_passes_over_element_errors() {
        let handler = DefaultFailureHandler::new();
        let err = FlowError::from(ActionError::ElementNotVisible("label".into()));
        assert!(matches!(
            handler.handle_failure("labels", FailureStrategy::Continue, &err),
            FailureHandlerResult::Continue(_)
        ));
        assert!(matches!(
            handler.handle_failure("labels", FailureStrategy::Abort, &err),
            FailureHandlerResult::Abort(_)
        ));
    }

    #[test]
    fn assertion_aborts_regardless_of_strategy() {
        let handler = DefaultFailureHandler::new();
        let err = FlowError::from(GateError::AssertionFailed("Non-AC bus".into()));
        assert!(matches!(
            handler.handle_failure("verify-ac", FailureStrategy::Continue, &err),
            FailureHandlerResult::Abort(_)
        ));
    }
}
