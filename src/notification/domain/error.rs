//! Error types for notification domain validation.

use super::Channel;
use thiserror::Error;

/// Errors raised while building or parsing notification values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationDomainError {
    /// The recipient address was empty.
    #[error("{0:?} recipient must not be empty")]
    EmptyRecipient(Channel),

    /// The email address is not plausibly valid.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The stored channel value is unknown.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// The stored delivery status is unknown.
    #[error("unknown delivery status: {0}")]
    UnknownStatus(String),
}
