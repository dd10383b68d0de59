//! Normalised delivery outcomes.

use serde::{Deserialize, Serialize};

/// Outcome of delivering over one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    /// The provider accepted the message.
    Sent {
        /// Recipient the message went to.
        to: String,
        /// Provider message identifier.
        provider_id: Option<String>,
    },
    /// Delivery failed.
    Failed {
        /// Recipient the attempt targeted.
        to: String,
        /// Failure description.
        error: String,
    },
    /// No attempt was made.
    Skipped {
        /// Why the channel was skipped.
        reason: String,
    },
}

impl ChannelOutcome {
    /// Creates a skipped outcome.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Returns whether the provider accepted the message.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    /// Returns a short label for staff-facing responses.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Sent { to, .. } => format!("sent to {to}"),
            Self::Failed { error, .. } => format!("failed: {error}"),
            Self::Skipped { reason } => reason.clone(),
        }
    }
}

/// Per-channel outcomes of one dispatch round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// SMS outcome.
    pub sms: ChannelOutcome,
    /// Email outcome.
    pub email: ChannelOutcome,
}

impl DeliveryReport {
    /// Returns whether the SMS was accepted.
    #[must_use]
    pub const fn sms_sent(&self) -> bool {
        self.sms.is_sent()
    }

    /// Returns whether the email was accepted.
    #[must_use]
    pub const fn email_sent(&self) -> bool {
        self.email.is_sent()
    }
}
