//! Workflow kinds.

use serde::{Deserialize, Serialize};

use super::WorkflowDomainError;

/// The three external-party confirmation workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    /// Customer accepts or rejects an order.
    OrderConfirmation,
    /// Property owner confirms or picks a visit slot.
    Bygherre,
    /// Customer approves or rejects photographed damage.
    PhotoReport,
}

impl WorkflowKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderConfirmation => "order_confirmation",
            Self::Bygherre => "bygherre",
            Self::PhotoReport => "photo_report",
        }
    }

    /// Returns the URL path segment the kind is served under.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::OrderConfirmation => "order-confirmation",
            Self::Bygherre => "bygherre",
            Self::PhotoReport => "photoreports",
        }
    }
}

impl TryFrom<&str> for WorkflowKind {
    type Error = WorkflowDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "order_confirmation" => Ok(Self::OrderConfirmation),
            "bygherre" => Ok(Self::Bygherre),
            "photo_report" => Ok(Self::PhotoReport),
            other => Err(WorkflowDomainError::UnknownKind(other.to_owned())),
        }
    }
}
