//! Error types for page operations

use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

/// Failures raised by a single page operation.
///
/// The first four kinds are the everyday noise of an unstable third-party
/// DOM and are absorbed by best-effort steps. `AssertionFailure` marks a
/// genuine correctness violation and always terminates a run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// No node matched the anchor (or the requested index was out of range)
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The node exists but is hidden, zero-sized or detached
    #[error("Element not visible: {0}")]
    ElementNotVisible(String),

    /// A bounded wait expired
    #[error("Action timeout: {0}")]
    ActionTimeout(String),

    /// Navigation or a URL wait expired
    #[error("Navigation timeout: {0}")]
    NavigationTimeout(String),

    /// A post-hoc check on page state failed
    #[error("Assertion failed: {0}")]
    AssertionFailure(String),

    /// DevTools transport or script failure
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Operation was cancelled
    #[error("Operation interrupted: {0}")]
    Interrupted(String),
}

impl ActionError {
    /// Whether trying a different candidate could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionError::ElementNotFound(_)
                | ActionError::ElementNotVisible(_)
                | ActionError::ActionTimeout(_)
                | ActionError::Cdp(_)
        )
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::AssertionFailure(_) => 3,
            ActionError::NavigationTimeout(_) | ActionError::Interrupted(_) => 2,
            ActionError::ActionTimeout(_) | ActionError::Cdp(_) => 1,
            ActionError::ElementNotFound(_) | ActionError::ElementNotVisible(_) => 0,
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, ActionError::AssertionFailure(_))
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        match err.kind {
            AdapterErrorKind::NavTimeout => ActionError::NavigationTimeout(err.to_string()),
            _ => ActionError::Cdp(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_is_critical_and_not_retryable() {
        let err = ActionError::AssertionFailure("non-AC bus in AC listing".into());
        assert_eq!(err.severity(), 3);
        assert!(!err.is_retryable());
        assert!(err.is_assertion());
    }

    #[test]
    fn adapter_timeouts_map_to_navigation_timeout() {
        let err: ActionError = AdapterError::new(AdapterErrorKind::NavTimeout).into();
        assert!(matches!(err, ActionError::NavigationTimeout(_)));
        let err: ActionError = AdapterError::cdp("closed").into();
        assert!(matches!(err, ActionError::Cdp(_)));
    }
}
