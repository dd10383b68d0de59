//! Action codes recorded on activity entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business event recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    /// An order confirmation was sent to the customer.
    OrderConfirmationSent,
    /// The customer answered an order confirmation.
    OrderConfirmationResponse,
    /// An order confirmation link was delivered again.
    OrderConfirmationResent,
    /// Staff activated a confirmed order.
    OrderConfirmationActivated,
    /// An order confirmation passed its expiry.
    OrderConfirmationExpired,
    /// A property owner was messaged.
    BygherreSmsSent,
    /// A property owner answered.
    BygherreResponse,
    /// Staff sent the final visit confirmation to a property owner.
    BygherreFinalConfirmation,
    /// A photo report draft was created.
    PhotoReportCreated,
    /// A photo report draft was edited.
    PhotoReportUpdated,
    /// A photo report was sent for review.
    PhotoReportSent,
    /// The customer reviewed a photo report.
    PhotoReportReviewed,
    /// A photo report was reset to draft.
    PhotoReportReset,
}

impl ActivityAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderConfirmationSent => "order_confirmation_sent",
            Self::OrderConfirmationResponse => "order_confirmation_response",
            Self::OrderConfirmationResent => "order_confirmation_resent",
            Self::OrderConfirmationActivated => "order_confirmation_activated",
            Self::OrderConfirmationExpired => "order_confirmation_expired",
            Self::BygherreSmsSent => "bygherre_sms_sent",
            Self::BygherreResponse => "bygherre_response",
            Self::BygherreFinalConfirmation => "bygherre_final_confirmation",
            Self::PhotoReportCreated => "photo_report_created",
            Self::PhotoReportUpdated => "photo_report_updated",
            Self::PhotoReportSent => "photo_report_sent",
            Self::PhotoReportReviewed => "photo_report_reviewed",
            Self::PhotoReportReset => "photo_report_reset",
        }
    }

    const ALL: [Self; 13] = [
        Self::OrderConfirmationSent,
        Self::OrderConfirmationResponse,
        Self::OrderConfirmationResent,
        Self::OrderConfirmationActivated,
        Self::OrderConfirmationExpired,
        Self::BygherreSmsSent,
        Self::BygherreResponse,
        Self::BygherreFinalConfirmation,
        Self::PhotoReportCreated,
        Self::PhotoReportUpdated,
        Self::PhotoReportSent,
        Self::PhotoReportReviewed,
        Self::PhotoReportReset,
    ];
}

/// Error returned while parsing action codes from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown activity action: {0}")]
pub struct ParseActivityActionError(pub String);

impl TryFrom<&str> for ActivityAction {
    type Error = ParseActivityActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| ParseActivityActionError(value.to_owned()))
    }
}
