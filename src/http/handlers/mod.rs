//! Route handlers.

pub(super) mod bygherre;
pub(super) mod communications;
pub(super) mod order_confirmation;
pub(super) mod photo_reports;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use serde::Serialize;

use super::ApiError;
use crate::notification::domain::DeliveryReport;
use crate::workflow::{
    domain::{WorkflowDefinition, WorkflowRecord},
    services::SendOutcome,
};

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Short per-channel labels for staff screens.
#[derive(Debug, Serialize)]
pub(super) struct NotificationLabels {
    sms: String,
    email: String,
}

impl From<&DeliveryReport> for NotificationLabels {
    fn from(report: &DeliveryReport) -> Self {
        Self {
            sms: report.sms.label(),
            email: report.email.label(),
        }
    }
}

/// Body returned after a link was sent.
#[derive(Serialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub(super) struct SentBody<K: WorkflowDefinition> {
    success: bool,
    record: WorkflowRecord<K>,
    public_url: String,
    notifications: NotificationLabels,
    delivery: DeliveryReport,
}

impl<K: WorkflowDefinition> From<SendOutcome<K>> for SentBody<K> {
    fn from(outcome: SendOutcome<K>) -> Self {
        Self {
            success: true,
            notifications: NotificationLabels::from(&outcome.delivery),
            record: outcome.record,
            public_url: outcome.public_url,
            delivery: outcome.delivery,
        }
    }
}
