//! Error types for gate validation

use action_primitives::ActionError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GateError {
    /// An expectation did not hold; ends the run
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    /// Invalid expectation spec
    #[error("Invalid ExpectSpec: {0}")]
    InvalidSpec(String),

    /// The page could not be read
    #[error("Browser error: {0}")]
    Browser(String),
}

impl GateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Browser(_))
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            GateError::AssertionFailed(_) => 3,
            GateError::InvalidSpec(_) => 2,
            GateError::Browser(_) => 1,
        }
    }
}

impl From<ActionError> for GateError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::AssertionFailure(msg) => GateError::AssertionFailed(msg),
            other => GateError::Browser(other.to_string()),
        }
    }
}

impl From<GateError> for ActionError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::AssertionFailed(msg) => ActionError::AssertionFailure(msg),
            GateError::InvalidSpec(msg) => ActionError::AssertionFailure(msg),
            GateError::Browser(msg) => ActionError::Cdp(msg),
        }
    }
}
