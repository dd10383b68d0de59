//! Order confirmation workflow.
//!
//! The customer contact reviews the order's line items and accepts or
//! rejects each one. Links expire after a fixed period; staff activate the
//! order once the customer has answered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{
    Acceptance, WorkflowDefinition, WorkflowDomainError, WorkflowEvent, WorkflowKind,
    WorkflowRecord, WorkflowState,
};
use crate::activity::domain::StaffActor;
use crate::task::domain::{TaskDamage, TaskFieldWrite, TaskStatus};

/// Marker type for the order confirmation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderConfirmation;

/// Order confirmation record.
pub type OrderConfirmationRecord = WorkflowRecord<OrderConfirmation>;

/// Order confirmation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderConfirmationStatus {
    /// Link dispatched, awaiting the customer.
    Sent,
    /// The customer answered.
    ResponseReceived,
    /// Staff activated the order.
    Activated,
    /// The link expired unanswered.
    Expired,
}

impl WorkflowState for OrderConfirmationStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::ResponseReceived => "response_received",
            Self::Activated => "activated",
            Self::Expired => "expired",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Sent,
                Self::ResponseReceived | Self::Activated | Self::Expired
            ) | (Self::ResponseReceived, Self::Activated)
        )
    }
}

/// Line item types offered on an order confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemType {
    /// The standard job, always present.
    Standard,
    /// Surcharge for work outside the standard service zone.
    ExtendedZone,
    /// Risk of glass breakage.
    GlassRisk,
    /// Chemical cleaning add-on.
    ChemicalCleaning,
}

impl LineItemType {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ExtendedZone => "extended_zone",
            Self::GlassRisk => "glass_risk",
            Self::ChemicalCleaning => "chemical_cleaning",
        }
    }
}

impl TryFrom<&str> for LineItemType {
    type Error = WorkflowDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "standard" => Ok(Self::Standard),
            "extended_zone" => Ok(Self::ExtendedZone),
            "glass_risk" => Ok(Self::GlassRisk),
            "chemical_cleaning" => Ok(Self::ChemicalCleaning),
            other => Err(WorkflowDomainError::validation(format!(
                "unknown line item type: {other}"
            ))),
        }
    }
}

/// One line of an order confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    /// Line item type.
    #[serde(rename = "type")]
    pub item_type: LineItemType,
    /// Staff note shown next to the line.
    pub custom_note: Option<String>,
    /// Customer answer.
    pub accepted: Acceptance,
    /// When the customer answered this line.
    pub responded_at: Option<DateTime<Utc>>,
}

impl OrderLineItem {
    fn offered(item_type: LineItemType, custom_note: Option<String>) -> Self {
        Self {
            item_type,
            custom_note,
            accepted: Acceptance::Unset,
            responded_at: None,
        }
    }
}

/// Service zone the task site lies in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceZone {
    /// Inside the standard zone.
    #[default]
    Standard,
    /// Outside the standard zone; adds a surcharge line.
    Extended,
}

const DEFAULT_TASK_TYPE: &str = "mixed";
const SOLO_GLASS: &str = "solo_glass";
const SOLO_CHEMICAL: &str = "solo_chemical";

/// Options staff choose when sending an order confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderOptions {
    /// Service zone of the site.
    pub service_zone: ServiceZone,
    /// Task type code, e.g. `mixed`, `solo_glass`, `solo_chemical`.
    pub task_type: String,
    /// Offer the glass risk line.
    pub add_glass_risk: bool,
    /// Offer the chemical cleaning line.
    pub add_chemical_cleaning: bool,
    /// Note shown on the glass risk line.
    pub glass_note: Option<String>,
    /// Note shown on the chemical cleaning line.
    pub chemical_note: Option<String>,
    /// Driving distance to the site.
    pub distance_km: Option<f64>,
    /// Driving time to the site.
    pub drive_time_minutes: Option<u32>,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            service_zone: ServiceZone::Standard,
            task_type: DEFAULT_TASK_TYPE.to_owned(),
            add_glass_risk: false,
            add_chemical_cleaning: false,
            glass_note: None,
            chemical_note: None,
            distance_km: None,
            drive_time_minutes: None,
        }
    }
}

impl OrderOptions {
    /// Derives the offered line items. `standard` always comes first.
    #[must_use]
    pub fn line_items(&self) -> Vec<OrderLineItem> {
        let mut items = vec![OrderLineItem::offered(LineItemType::Standard, None)];
        if self.service_zone == ServiceZone::Extended {
            items.push(OrderLineItem::offered(LineItemType::ExtendedZone, None));
        }
        if self.add_glass_risk || self.task_type == SOLO_GLASS {
            items.push(OrderLineItem::offered(
                LineItemType::GlassRisk,
                self.glass_note.clone(),
            ));
        }
        if self.add_chemical_cleaning || self.task_type == SOLO_CHEMICAL {
            items.push(OrderLineItem::offered(
                LineItemType::ChemicalCleaning,
                self.chemical_note.clone(),
            ));
        }
        items
    }
}

/// Task fields frozen onto the confirmation when it is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    /// Street address.
    pub address: String,
    /// Postal code.
    pub postal_code: String,
    /// City.
    pub city: String,
    /// Customer company name.
    pub company_name: Option<String>,
    /// Recipient contact name.
    pub contact_name: Option<String>,
    /// Recipient contact email.
    pub contact_email: Option<String>,
    /// Human-facing task number.
    pub task_number: Option<String>,
    /// Registered damage lines.
    pub damages: Vec<TaskDamage>,
}

/// Order confirmation fields outside the generic record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmationDetails {
    /// Options the line items were derived from.
    #[serde(flatten)]
    pub options: OrderOptions,
    /// Overall answer; `true` unless the customer explicitly declined.
    pub overall_accepted: Option<bool>,
}

/// Customer answer to one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemAnswer {
    /// Line item answered.
    pub item_type: LineItemType,
    /// Whether the line was accepted.
    pub accepted: bool,
}

/// Validated customer response to an order confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmationResponse {
    answers: Vec<ItemAnswer>,
    overall_accepted: Option<bool>,
}

impl OrderConfirmationResponse {
    /// Validates a response.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Validation`] when a line type is
    /// answered more than once.
    pub fn new(
        answers: Vec<ItemAnswer>,
        overall_accepted: Option<bool>,
    ) -> Result<Self, WorkflowDomainError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = answers.iter().find(|answer| !seen.insert(answer.item_type)) {
            return Err(WorkflowDomainError::validation(format!(
                "line item {} answered more than once",
                duplicate.item_type.as_str()
            )));
        }
        Ok(Self {
            answers,
            overall_accepted,
        })
    }

    /// Returns the per-line answers.
    #[must_use]
    pub fn answers(&self) -> &[ItemAnswer] {
        &self.answers
    }
}

impl WorkflowRecord<OrderConfirmation> {
    /// Returns the state as seen at `now`, treating a lapsed link as expired.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> OrderConfirmationStatus {
        if self.status == OrderConfirmationStatus::Sent && self.is_expired(now) {
            OrderConfirmationStatus::Expired
        } else {
            self.status
        }
    }

    /// Records the customer's response.
    ///
    /// Answers are matched to stored lines by type; stored lines without an
    /// answer stay unset and answers for lines not offered are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::AlreadyResponded`] when a response is
    /// already recorded, or [`WorkflowDomainError::InvalidTransition`] when
    /// the record no longer accepts answers.
    pub fn record_response(
        &mut self,
        response: &OrderConfirmationResponse,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowDomainError> {
        if self.has_response() {
            return Err(WorkflowDomainError::AlreadyResponded);
        }
        self.transition(OrderConfirmationStatus::ResponseReceived, now)?;
        for item in &mut self.items {
            if let Some(answer) = response
                .answers
                .iter()
                .find(|answer| answer.item_type == item.item_type)
            {
                item.accepted = answer.accepted.into();
                item.responded_at = Some(now);
            }
        }
        self.details.overall_accepted = Some(response.overall_accepted != Some(false));
        self.responded_at = Some(now);
        Ok(())
    }

    /// Activates the order.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] unless the record
    /// is `sent` or `response_received`.
    pub fn activate(
        &mut self,
        by: StaffActor,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowDomainError> {
        self.transition(OrderConfirmationStatus::Activated, now)?;
        self.audit.finalized_by = Some(by);
        Ok(())
    }

    /// Marks a lapsed link as expired.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] unless the record
    /// is `sent`.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), WorkflowDomainError> {
        self.transition(OrderConfirmationStatus::Expired, now)
    }

    /// Describes the answers to the optional lines, e.g.
    /// `extended_zone: rejected, glass_risk: accepted`.
    #[must_use]
    pub fn answer_summary(&self) -> String {
        let parts: Vec<String> = self
            .items
            .iter()
            .filter(|item| item.item_type != LineItemType::Standard)
            .map(|item| {
                let answer = match item.accepted {
                    Acceptance::Accepted => "accepted",
                    Acceptance::Rejected => "rejected",
                    Acceptance::Unset => "unanswered",
                };
                format!("{}: {answer}", item.item_type.as_str())
            })
            .collect();
        if parts.is_empty() {
            "standard order only".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

impl WorkflowDefinition for OrderConfirmation {
    const KIND: WorkflowKind = WorkflowKind::OrderConfirmation;

    type State = OrderConfirmationStatus;
    type Item = OrderLineItem;
    type Snapshot = OrderSnapshot;
    type Details = OrderConfirmationDetails;

    fn task_writes(record: &WorkflowRecord<Self>, event: WorkflowEvent) -> Vec<TaskFieldWrite> {
        let status = |state: OrderConfirmationStatus| TaskFieldWrite::OrderConfirmationStatus {
            status: state.as_str().to_owned(),
        };
        match event {
            WorkflowEvent::Sent => vec![TaskFieldWrite::OrderConfirmationSent {
                confirmation_id: record.id.into_inner(),
            }],
            WorkflowEvent::Responded => vec![TaskFieldWrite::OrderConfirmationResponded],
            WorkflowEvent::Finalized => vec![
                status(OrderConfirmationStatus::Activated),
                TaskFieldWrite::Status(TaskStatus::active()),
            ],
            WorkflowEvent::Expired => vec![status(OrderConfirmationStatus::Expired)],
        }
    }

    fn is_open(record: &WorkflowRecord<Self>, now: DateTime<Utc>) -> bool {
        matches!(
            record.effective_status(now),
            OrderConfirmationStatus::Sent | OrderConfirmationStatus::ResponseReceived
        )
    }
}
