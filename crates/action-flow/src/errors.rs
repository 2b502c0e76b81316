//! Flow execution error types

use action_gate::GateError;
use action_locator::LocatorError;
use action_primitives::ActionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid flow structure: {0}")]
    InvalidStructure(String),

    #[error("Flow execution timed out after {0}ms")]
    Timeout(u64),

    #[error("Flow interrupted")]
    Interrupted,

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Gate(#[from] GateError),
}

impl FlowError {
    /// Failures that end the run whatever the step's strategy says.
    pub fn is_fatal(&self) -> bool {
        match self {
            FlowError::Action(err) => {
                err.is_assertion() || matches!(err, ActionError::Interrupted(_))
            }
            FlowError::Gate(err) => matches!(err, GateError::AssertionFailed(_)),
            FlowError::Locator(LocatorError::Interrupted(_)) => true,
            FlowError::Interrupted | FlowError::Timeout(_) => true,
            _ => false,
        }
    }

    pub fn is_assertion(&self) -> bool {
        match self {
            FlowError::Action(err) => err.is_assertion(),
            FlowError::Gate(err) => matches!(err, GateError::AssertionFailed(_)),
            _ => false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            FlowError::Action(err) => err.is_retryable(),
            FlowError::Locator(err) => err.is_retryable(),
            FlowError::Gate(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            FlowError::Action(err) => err.severity(),
            FlowError::Locator(err) => err.severity(),
            FlowError::Gate(err) => err.severity(),
            FlowError::Interrupted | FlowError::Timeout(_) => 2,
            FlowError::ValidationFailed(_) | FlowError::InvalidStructure(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertions_are_fatal() {
        let err = FlowError::from(GateError::AssertionFailed("AC filter".into()));
        assert!(err.is_fatal());
        assert!(err.is_assertion());
        assert_eq!(err.severity(), 3);

        let err = FlowError::from(ActionError::AssertionFailure("x".into()));
        assert!(err.is_fatal());
    }

    #[test]
    fn element_errors_are_not_fatal() {
        assert!(!FlowError::from(ActionError::ElementNotFound("#srcbtn".into())).is_fatal());
        assert!(!FlowError::from(ActionError::NavigationTimeout("list".into())).is_fatal());
        assert!(!FlowError::from(GateError::Browser("closed".into())).is_fatal());
        assert!(FlowError::from(ActionError::ElementNotFound("#seat".into())).is_retryable());
    }
}
