//! Workflow status fields mirrored onto a task.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TaskStatus;

/// Visit slot confirmed with a property owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledVisit {
    /// Visit date.
    pub date: NaiveDate,
    /// Time slot code, e.g. `08-10`.
    pub time_slot: String,
    /// How the technician gets access (`home` or `key`).
    pub access_method: Option<String>,
    /// Where the key can be collected.
    pub key_location: Option<String>,
    /// Owner remarks.
    pub remarks: Option<String>,
}

/// Status fields other subsystems read to render workflow badges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMirror {
    /// Latest order confirmation sent for the task.
    pub order_confirmation_id: Option<Uuid>,
    /// Mirrored order confirmation status.
    pub order_confirmation_status: Option<String>,
    /// When the order confirmation was sent.
    pub order_confirmation_sent_at: Option<DateTime<Utc>>,
    /// When the customer responded to the order confirmation.
    pub order_confirmation_responded_at: Option<DateTime<Utc>>,
    /// Whether a property-owner message is awaiting a reply.
    pub bygherre_comm_pending: bool,
    /// Property-owner communication awaiting a reply.
    pub bygherre_comm_id: Option<Uuid>,
    /// Type of the pending property-owner communication.
    pub bygherre_comm_type: Option<String>,
    /// Whether a visit slot has been confirmed with the owner.
    pub bygherre_confirmed: bool,
    /// The confirmed visit slot.
    pub bygherre_confirmed_visit: Option<ScheduledVisit>,
}

/// Targeted write against a task's mirror fields.
///
/// Workflows never replace a task document; they emit these writes and the
/// task store applies them field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TaskFieldWrite {
    /// An order confirmation was sent.
    OrderConfirmationSent {
        /// Confirmation record identifier.
        confirmation_id: Uuid,
    },
    /// The customer responded to the order confirmation.
    OrderConfirmationResponded,
    /// Mirror a new order confirmation status.
    OrderConfirmationStatus {
        /// Status string as stored on the workflow record.
        status: String,
    },
    /// Move the task into another status bucket.
    Status(TaskStatus),
    /// A property-owner message now awaits a reply.
    BygherrePending {
        /// Communication record identifier.
        communication_id: Uuid,
        /// Communication type code.
        communication_type: String,
    },
    /// A property-owner message was answered or finalised.
    ///
    /// Clears the pending flag only while this message is the pending one.
    BygherreSettled {
        /// Communication record identifier.
        communication_id: Uuid,
    },
    /// A visit slot was confirmed with the owner.
    BygherreConfirmed(ScheduledVisit),
}

impl WorkflowMirror {
    pub(super) fn apply(&mut self, write: &TaskFieldWrite, at: DateTime<Utc>) {
        match write {
            TaskFieldWrite::OrderConfirmationSent { confirmation_id } => {
                self.order_confirmation_id = Some(*confirmation_id);
                self.order_confirmation_status = Some("sent".to_owned());
                self.order_confirmation_sent_at = Some(at);
                self.order_confirmation_responded_at = None;
            }
            TaskFieldWrite::OrderConfirmationResponded => {
                self.order_confirmation_status = Some("response_received".to_owned());
                self.order_confirmation_responded_at = Some(at);
            }
            TaskFieldWrite::OrderConfirmationStatus { status } => {
                self.order_confirmation_status = Some(status.clone());
            }
            TaskFieldWrite::BygherrePending {
                communication_id,
                communication_type,
            } => {
                self.bygherre_comm_pending = true;
                self.bygherre_comm_id = Some(*communication_id);
                self.bygherre_comm_type = Some(communication_type.clone());
            }
            TaskFieldWrite::BygherreSettled { communication_id } => {
                if self.bygherre_comm_id == Some(*communication_id) {
                    self.bygherre_comm_pending = false;
                }
            }
            TaskFieldWrite::BygherreConfirmed(visit) => {
                self.bygherre_confirmed = true;
                self.bygherre_confirmed_visit = Some(visit.clone());
            }
            // Status writes target the task itself.
            TaskFieldWrite::Status(_) => {}
        }
    }
}
