//! Outbound message content.

use super::{Channel, NotificationDomainError};
use serde::{Deserialize, Serialize};

/// One message addressed to one recipient over one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Text message.
    Sms {
        /// Recipient phone number as entered.
        to: String,
        /// Message body.
        body: String,
    },
    /// HTML email.
    Email {
        /// Recipient email address.
        to: String,
        /// Subject line.
        subject: String,
        /// HTML body.
        html: String,
    },
}

impl OutboundMessage {
    /// Builds a text message.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::EmptyRecipient`] when `to` is blank.
    pub fn sms(to: &str, body: impl Into<String>) -> Result<Self, NotificationDomainError> {
        let trimmed = to.trim();
        if trimmed.is_empty() {
            return Err(NotificationDomainError::EmptyRecipient(Channel::Sms));
        }
        Ok(Self::Sms {
            to: trimmed.to_owned(),
            body: body.into(),
        })
    }

    /// Builds an email.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationDomainError::EmptyRecipient`] when `to` is blank
    /// and [`NotificationDomainError::InvalidEmail`] when it lacks an `@`.
    pub fn email(
        to: &str,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Result<Self, NotificationDomainError> {
        let trimmed = to.trim();
        if trimmed.is_empty() {
            return Err(NotificationDomainError::EmptyRecipient(Channel::Email));
        }
        if !trimmed.contains('@') {
            return Err(NotificationDomainError::InvalidEmail(trimmed.to_owned()));
        }
        Ok(Self::Email {
            to: trimmed.to_owned(),
            subject: subject.into(),
            html: html.into(),
        })
    }

    /// Returns the delivery channel.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        match self {
            Self::Sms { .. } => Channel::Sms,
            Self::Email { .. } => Channel::Email,
        }
    }

    /// Returns the recipient address.
    #[must_use]
    pub fn recipient(&self) -> &str {
        match self {
            Self::Sms { to, .. } | Self::Email { to, .. } => to,
        }
    }

    /// Returns a short description stored on the ledger entry.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Sms { body, .. } => body.chars().take(160).collect(),
            Self::Email { subject, .. } => subject.clone(),
        }
    }
}
