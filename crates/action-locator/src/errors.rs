//! Error types for the locator

use thiserror::Error;

/// Conditions that stop a resolution outright.
///
/// Candidates that fail to resolve are not errors; they are recorded as
/// [`crate::CandidateOutcome`]s.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// Nothing to try
    #[error("No candidates for {0}")]
    EmptyCandidates(String),

    /// Options that make resolution impossible (zero scan limit, zero poll interval)
    #[error("Invalid locate options: {0}")]
    InvalidOptions(String),

    /// Run cancelled while resolving
    #[error("Resolution interrupted: {0}")]
    Interrupted(String),
}

impl LocatorError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Interrupted(_) => 2,
            LocatorError::EmptyCandidates(_) | LocatorError::InvalidOptions(_) => 1,
        }
    }
}
