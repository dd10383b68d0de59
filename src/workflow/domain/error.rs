//! Domain errors for workflow records.

use thiserror::Error;

/// Errors raised by workflow state machines and response validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// The requested transition is not allowed from the current state.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: &'static str,
        /// Requested state.
        to: &'static str,
    },

    /// The record has already received its response.
    #[error("a response has already been recorded")]
    AlreadyResponded,

    /// The record can no longer be edited.
    #[error("record is {status} and can no longer be edited")]
    NotEditable {
        /// Current state.
        status: &'static str,
    },

    /// A response or staff payload failed validation.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Stored kind code is not recognised.
    #[error("unknown workflow kind: {0}")]
    UnknownKind(String),

    /// Stored status code is not recognised.
    #[error("unknown workflow status: {0}")]
    UnknownStatus(String),
}

impl WorkflowDomainError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
