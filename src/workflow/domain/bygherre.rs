//! Property-owner ("bygherre") scheduling workflow.
//!
//! Owners are told about a task at their address and, for the scheduling
//! types, asked to confirm or pick a proposed visit slot. The proposed
//! slots are the record's response units and never change after sending;
//! an owner's selection refers to them by index.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{
    WorkflowDefinition, WorkflowDomainError, WorkflowEvent, WorkflowId, WorkflowKind,
    WorkflowRecord, WorkflowState,
};
use crate::activity::domain::StaffActor;
use crate::task::domain::{ScheduledVisit, TaskFieldWrite};

const MAX_INDOOR_SLOTS: usize = 3;

/// Marker type for the property-owner workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bygherre;

/// Property-owner communication record.
pub type BygherreRecord = WorkflowRecord<Bygherre>;

/// Property-owner communication states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BygherreStatus {
    /// Message dispatched.
    Sent,
    /// The owner confirmed.
    Accepted,
    /// The owner declined.
    Declined,
    /// Staff sent the final visit confirmation.
    Confirmed,
}

impl WorkflowState for BygherreStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Confirmed => "confirmed",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Sent, Self::Accepted | Self::Declined | Self::Confirmed)
                | (Self::Accepted | Self::Declined, Self::Confirmed)
        )
    }
}

/// What the owner is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationType {
    /// Notification only; no response expected.
    ConfirmTask,
    /// Confirm a single outdoor visit slot.
    ScheduleOutdoor,
    /// Pick among up to three indoor visit slots and describe access.
    ScheduleIndoor,
}

impl CommunicationType {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfirmTask => "confirm_task",
            Self::ScheduleOutdoor => "schedule_outdoor",
            Self::ScheduleIndoor => "schedule_indoor",
        }
    }

    /// Returns whether the technician needs access to the building.
    #[must_use]
    pub const fn requires_access(self) -> bool {
        matches!(self, Self::ScheduleIndoor)
    }

    /// Returns whether the owner is expected to answer.
    #[must_use]
    pub const fn expects_response(self) -> bool {
        !matches!(self, Self::ConfirmTask)
    }

    /// Returns the public page path segment for this type.
    #[must_use]
    pub const fn public_path(self) -> &'static str {
        match self {
            Self::ScheduleIndoor => "vaelg-dato",
            Self::ConfirmTask | Self::ScheduleOutdoor => "bekraeft",
        }
    }

    /// Checks the proposed slots against the type.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Validation`] when outdoor scheduling
    /// does not propose exactly one slot or indoor scheduling proposes none
    /// or more than three.
    pub fn validate_slots(self, slots: &[ProposedSlot]) -> Result<(), WorkflowDomainError> {
        match (self, slots.len()) {
            (Self::ConfirmTask, _) | (Self::ScheduleOutdoor, 1) => Ok(()),
            (Self::ScheduleIndoor, count) if (1..=MAX_INDOOR_SLOTS).contains(&count) => Ok(()),
            (Self::ScheduleOutdoor, count) => Err(WorkflowDomainError::validation(format!(
                "outdoor scheduling proposes exactly one date, got {count}"
            ))),
            (Self::ScheduleIndoor, count) => Err(WorkflowDomainError::validation(format!(
                "indoor scheduling proposes one to {MAX_INDOOR_SLOTS} dates, got {count}"
            ))),
        }
    }
}

impl TryFrom<&str> for CommunicationType {
    type Error = WorkflowDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "confirm_task" => Ok(Self::ConfirmTask),
            "schedule_outdoor" => Ok(Self::ScheduleOutdoor),
            "schedule_indoor" => Ok(Self::ScheduleIndoor),
            other => Err(WorkflowDomainError::validation(format!(
                "unknown communication type: {other}"
            ))),
        }
    }
}

/// One proposed visit slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedSlot {
    /// Visit date.
    pub date: NaiveDate,
    /// Time slot code, e.g. `08-10`.
    pub time_slot: String,
}

/// Task fields frozen onto the communication when it is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BygherreSnapshot {
    /// Street address.
    pub address: String,
    /// Postal code.
    pub postal_code: String,
    /// City.
    pub city: String,
    /// Customer company name.
    pub company_name: Option<String>,
    /// Owner display name.
    pub owner_name: Option<String>,
    /// Phone number the message went to.
    pub owner_phone: Option<String>,
    /// Owner email address.
    pub owner_email: Option<String>,
    /// Summary of the work.
    pub task_summary: Option<String>,
}

/// How the technician gets into the building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    /// The owner is home.
    Home,
    /// A key is left somewhere.
    Key,
}

impl AccessMethod {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Key => "key",
        }
    }
}

/// Owner answer as submitted through the public page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BygherreAnswer {
    /// Whether the owner confirms.
    pub confirmed: bool,
    /// Indices into the proposed slots.
    pub selected_dates: Vec<usize>,
    /// Access method for indoor work.
    pub access_method: Option<AccessMethod>,
    /// Where the key can be collected.
    pub key_location: Option<String>,
    /// Dates the owner suggests instead.
    pub alternative_dates: Option<String>,
    /// Free-text remarks.
    pub remarks: Option<String>,
    /// Phone number the owner prefers.
    pub phone: Option<String>,
}

/// Stored owner response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BygherreResponse {
    /// Whether the owner confirmed.
    pub confirmed: bool,
    /// Indices into the proposed slots.
    pub selected_dates: Vec<usize>,
    /// Access method for indoor work.
    pub access_method: Option<AccessMethod>,
    /// Where the key can be collected.
    pub key_location: Option<String>,
    /// Dates the owner suggests instead.
    pub alternative_dates: Option<String>,
    /// Free-text remarks.
    pub remarks: Option<String>,
    /// Phone number the owner prefers.
    pub phone: Option<String>,
    /// When the response arrived.
    pub submitted_at: DateTime<Utc>,
}

/// Property-owner communication fields outside the generic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BygherreDetails {
    /// Communication type.
    #[serde(rename = "type")]
    pub communication_type: CommunicationType,
    /// Whether the technician needs access to the building.
    pub requires_access: bool,
    /// Optional staff message.
    pub message: Option<String>,
    /// Owner response.
    pub response: Option<BygherreResponse>,
    /// Date confirmed in the final confirmation.
    pub confirmed_date: Option<NaiveDate>,
    /// Time slot confirmed in the final confirmation.
    pub confirmed_time_slot: Option<String>,
    /// Whether the final confirmation was sent.
    pub final_confirmation_sent: bool,
    /// When the final confirmation was sent.
    pub final_confirmation_sent_at: Option<DateTime<Utc>>,
}

impl BygherreDetails {
    /// Creates details for a freshly sent communication.
    #[must_use]
    pub const fn new(communication_type: CommunicationType, message: Option<String>) -> Self {
        Self {
            communication_type,
            requires_access: communication_type.requires_access(),
            message,
            response: None,
            confirmed_date: None,
            confirmed_time_slot: None,
            final_confirmation_sent: false,
            final_confirmation_sent_at: None,
        }
    }
}

/// Narrow view of a communication shown on the public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BygherrePublicView {
    /// Record identifier.
    pub id: WorkflowId,
    /// Communication type.
    #[serde(rename = "type")]
    pub communication_type: CommunicationType,
    /// Display fields.
    pub task_info: BygherreSnapshot,
    /// Proposed visit slots.
    pub proposed_dates: Vec<ProposedSlot>,
    /// Whether the technician needs access to the building.
    pub requires_access: bool,
    /// Current status.
    pub status: BygherreStatus,
    /// Whether the owner has already answered.
    pub has_responded: bool,
}

impl WorkflowRecord<Bygherre> {
    /// Returns the communication type.
    #[must_use]
    pub const fn communication_type(&self) -> CommunicationType {
        self.details.communication_type
    }

    /// Returns the view served on the public page.
    #[must_use]
    pub fn public_view(&self) -> BygherrePublicView {
        BygherrePublicView {
            id: self.id,
            communication_type: self.details.communication_type,
            task_info: self.snapshot.clone(),
            proposed_dates: self.items.clone(),
            requires_access: self.details.requires_access,
            status: self.status,
            has_responded: self.details.response.is_some(),
        }
    }

    /// Records the owner's answer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::AlreadyResponded`] on a second answer,
    /// [`WorkflowDomainError::InvalidTransition`] for notification-only
    /// messages and [`WorkflowDomainError::Validation`] when selected
    /// indices do not point into the proposed slots.
    pub fn record_response(
        &mut self,
        answer: BygherreAnswer,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowDomainError> {
        if self.has_response() || self.details.response.is_some() {
            return Err(WorkflowDomainError::AlreadyResponded);
        }
        let next = if answer.confirmed {
            BygherreStatus::Accepted
        } else {
            BygherreStatus::Declined
        };
        if !self.details.communication_type.expects_response() {
            return Err(WorkflowDomainError::InvalidTransition {
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.validate_answer(&answer)?;
        self.transition(next, now)?;
        let BygherreAnswer {
            confirmed,
            selected_dates,
            access_method,
            key_location,
            alternative_dates,
            remarks,
            phone,
        } = answer;
        self.details.response = Some(BygherreResponse {
            confirmed,
            selected_dates,
            access_method,
            key_location,
            alternative_dates,
            remarks,
            phone,
            submitted_at: now,
        });
        self.responded_at = Some(now);
        Ok(())
    }

    fn validate_answer(&self, answer: &BygherreAnswer) -> Result<(), WorkflowDomainError> {
        if !answer.confirmed && !answer.selected_dates.is_empty() {
            return Err(WorkflowDomainError::validation(
                "a declined answer cannot select dates",
            ));
        }
        let mut seen = HashSet::new();
        for index in &answer.selected_dates {
            if *index >= self.items.len() {
                return Err(WorkflowDomainError::validation(format!(
                    "selected date {index} is not among the {} proposed",
                    self.items.len()
                )));
            }
            if !seen.insert(*index) {
                return Err(WorkflowDomainError::validation(format!(
                    "selected date {index} given more than once"
                )));
            }
        }
        let key_location_missing = answer
            .key_location
            .as_deref()
            .is_none_or(|location| location.trim().is_empty());
        if answer.access_method == Some(AccessMethod::Key) && key_location_missing {
            return Err(WorkflowDomainError::validation(
                "key access requires a key location",
            ));
        }
        Ok(())
    }

    /// Returns the visit the owner's answer settles without staff input.
    ///
    /// An accepted outdoor proposal with its single slot, or the first
    /// selected indoor slot. The slot always comes from the stored proposal.
    #[must_use]
    pub fn settled_visit(&self) -> Option<ScheduledVisit> {
        let response = self.details.response.as_ref().filter(|r| r.confirmed)?;
        let slot = match self.details.communication_type {
            CommunicationType::ScheduleOutdoor => match self.items.as_slice() {
                [only] => only,
                _ => return None,
            },
            CommunicationType::ScheduleIndoor => {
                let index = response.selected_dates.first()?;
                self.items.get(*index)?
            }
            CommunicationType::ConfirmTask => return None,
        };
        Some(visit_from(slot.date, &slot.time_slot, Some(response)))
    }

    /// Returns the visit fixed by the final confirmation.
    #[must_use]
    pub fn final_visit(&self) -> Option<ScheduledVisit> {
        let date = self.details.confirmed_date?;
        let time_slot = self.details.confirmed_time_slot.as_deref()?;
        Some(visit_from(date, time_slot, self.details.response.as_ref()))
    }

    /// Fixes the final visit slot for indoor scheduling.
    ///
    /// Without an explicit date the first selected proposed slot is used.
    /// An explicit date without a time slot takes the slot proposed for
    /// that date.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] for other types or
    /// when already confirmed, and [`WorkflowDomainError::Validation`] when
    /// no slot can be determined.
    pub fn confirm_final(
        &mut self,
        date: Option<NaiveDate>,
        time_slot: Option<String>,
        by: StaffActor,
        now: DateTime<Utc>,
    ) -> Result<ScheduledVisit, WorkflowDomainError> {
        if self.details.communication_type != CommunicationType::ScheduleIndoor {
            return Err(WorkflowDomainError::InvalidTransition {
                from: self.status.as_str(),
                to: BygherreStatus::Confirmed.as_str(),
            });
        }
        let (confirmed_date, confirmed_slot) = self.resolve_final_slot(date, time_slot)?;
        self.transition(BygherreStatus::Confirmed, now)?;
        self.details.confirmed_date = Some(confirmed_date);
        self.details.confirmed_time_slot = Some(confirmed_slot.clone());
        self.details.final_confirmation_sent = true;
        self.details.final_confirmation_sent_at = Some(now);
        self.audit.finalized_by = Some(by);
        Ok(visit_from(
            confirmed_date,
            &confirmed_slot,
            self.details.response.as_ref(),
        ))
    }

    fn resolve_final_slot(
        &self,
        date: Option<NaiveDate>,
        time_slot: Option<String>,
    ) -> Result<(NaiveDate, String), WorkflowDomainError> {
        match (date, time_slot) {
            (Some(chosen), Some(slot)) => Ok((chosen, slot)),
            (Some(chosen), None) => self
                .items
                .iter()
                .find(|proposed| proposed.date == chosen)
                .map(|proposed| (chosen, proposed.time_slot.clone()))
                .ok_or_else(|| {
                    WorkflowDomainError::validation(format!(
                        "no time slot given and {chosen} was not proposed"
                    ))
                }),
            (None, _) => self
                .details
                .response
                .as_ref()
                .and_then(|response| response.selected_dates.first())
                .and_then(|index| self.items.get(*index))
                .map(|proposed| (proposed.date, proposed.time_slot.clone()))
                .ok_or_else(|| WorkflowDomainError::validation("no confirmed date given")),
        }
    }
}

fn visit_from(
    date: NaiveDate,
    time_slot: &str,
    response: Option<&BygherreResponse>,
) -> ScheduledVisit {
    ScheduledVisit {
        date,
        time_slot: time_slot.to_owned(),
        access_method: response
            .and_then(|r| r.access_method)
            .map(|method| method.as_str().to_owned()),
        key_location: response.and_then(|r| r.key_location.clone()),
        remarks: response.and_then(|r| r.remarks.clone()),
    }
}

impl WorkflowDefinition for Bygherre {
    const KIND: WorkflowKind = WorkflowKind::Bygherre;

    type State = BygherreStatus;
    type Item = ProposedSlot;
    type Snapshot = BygherreSnapshot;
    type Details = BygherreDetails;

    fn task_writes(record: &WorkflowRecord<Self>, event: WorkflowEvent) -> Vec<TaskFieldWrite> {
        let communication_type = record.details.communication_type;
        let communication_id = record.id.into_inner();
        let settled = TaskFieldWrite::BygherreSettled { communication_id };
        match event {
            WorkflowEvent::Sent if communication_type.expects_response() => {
                vec![TaskFieldWrite::BygherrePending {
                    communication_id,
                    communication_type: communication_type.as_str().to_owned(),
                }]
            }
            WorkflowEvent::Responded => std::iter::once(settled)
                .chain(record.settled_visit().map(TaskFieldWrite::BygherreConfirmed))
                .collect(),
            WorkflowEvent::Finalized => std::iter::once(settled)
                .chain(record.final_visit().map(TaskFieldWrite::BygherreConfirmed))
                .collect(),
            WorkflowEvent::Sent | WorkflowEvent::Expired => Vec::new(),
        }
    }

    fn is_open(record: &WorkflowRecord<Self>, _now: DateTime<Utc>) -> bool {
        match (record.details.communication_type, record.status) {
            (CommunicationType::ConfirmTask, _) => false,
            (_, BygherreStatus::Sent) => true,
            (CommunicationType::ScheduleIndoor, BygherreStatus::Accepted) => {
                !record.details.final_confirmation_sent
            }
            _ => false,
        }
    }
}
