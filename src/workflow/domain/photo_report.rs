//! Photo-report review workflow.
//!
//! Staff draft a report of photographed damage, send it, and the customer
//! approves or rejects each damage entry. A reset returns the report to
//! draft under a new token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{
    AccessToken, WorkflowDefinition, WorkflowDomainError, WorkflowEvent, WorkflowKind,
    WorkflowRecord, WorkflowState,
};
use crate::activity::domain::StaffActor;
use crate::task::domain::TaskFieldWrite;

const DEFAULT_REVIEWER_NAME: &str = "Customer";

/// Marker type for the photo-report workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoReport;

/// Photo report record.
pub type PhotoReportRecord = WorkflowRecord<PhotoReport>;

/// Photo report states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoReportStatus {
    /// Editable, not yet sent.
    Draft,
    /// Sent to the customer.
    Sent,
    /// The customer submitted a review.
    Reviewed,
}

impl WorkflowState for PhotoReportStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Reviewed => "reviewed",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Sent) | (Self::Sent, Self::Reviewed)
        )
    }
}

/// Review outcome of one damage entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageStatus {
    /// Not yet reviewed.
    #[default]
    Pending,
    /// The customer approved the repair.
    Approved,
    /// The customer rejected the repair.
    Rejected,
}

/// One photographed damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageEntry {
    /// Stable identifier within the report.
    pub id: String,
    /// Damaged item.
    pub item: Option<String>,
    /// Damage type.
    #[serde(rename = "type")]
    pub damage_type: Option<String>,
    /// Where on the site the damage is.
    pub location: Option<String>,
    /// Staff notes.
    pub notes: Option<String>,
    /// Close-up photo URL.
    pub closeup_photo: Option<String>,
    /// Overview photo URL.
    pub location_photo: Option<String>,
    /// Review outcome.
    pub status: DamageStatus,
    /// Customer note attached during review.
    pub customer_note: Option<String>,
}

/// Damage entry as entered by staff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageDraft {
    /// Existing identifier; a new one is assigned when absent.
    pub id: Option<String>,
    /// Damaged item.
    pub item: Option<String>,
    /// Damage type.
    #[serde(rename = "type")]
    pub damage_type: Option<String>,
    /// Where on the site the damage is.
    pub location: Option<String>,
    /// Staff notes.
    pub notes: Option<String>,
    /// Close-up photo URL.
    pub closeup_photo: Option<String>,
    /// Overview photo URL.
    pub location_photo: Option<String>,
}

impl DamageDraft {
    /// Turns the draft into a pending damage entry.
    #[must_use]
    pub fn into_entry(self) -> DamageEntry {
        DamageEntry {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            item: self.item,
            damage_type: self.damage_type,
            location: self.location,
            notes: self.notes,
            closeup_photo: self.closeup_photo,
            location_photo: self.location_photo,
            status: DamageStatus::Pending,
            customer_note: None,
        }
    }

    /// Turns a draft list into pending entries.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Validation`] when two drafts carry the
    /// same id, since such a report could never be reviewed.
    pub fn into_entries(drafts: Vec<Self>) -> Result<Vec<DamageEntry>, WorkflowDomainError> {
        let entries: Vec<DamageEntry> = drafts.into_iter().map(Self::into_entry).collect();
        let mut seen = HashSet::with_capacity(entries.len());
        if let Some(repeated) = entries.iter().find(|entry| !seen.insert(entry.id.as_str())) {
            return Err(WorkflowDomainError::validation(format!(
                "damage id {} is used more than once",
                repeated.id
            )));
        }
        Ok(entries)
    }
}

/// Recipient and site fields of a photo report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContact {
    /// Recipient name.
    pub contact_name: Option<String>,
    /// Recipient email.
    pub contact_email: Option<String>,
    /// Recipient phone.
    pub contact_phone: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// City.
    pub city: Option<String>,
}

/// Photo report fields outside the generic record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoReportDetails {
    /// Staff notes on the whole report.
    pub notes: Option<String>,
    /// Whether the last send reached the customer by SMS.
    pub sms_sent: bool,
    /// Whether the last send reached the customer by email.
    pub email_sent: bool,
    /// Name the reviewer signed with.
    pub reviewer_name: Option<String>,
    /// Signature payload, passed through unchanged.
    pub reviewer_signature: Option<String>,
}

/// Staff edits to a draft. `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftUpdate {
    /// Replacement recipient and site fields.
    pub contact: Option<ReportContact>,
    /// Replacement report notes.
    pub notes: Option<String>,
    /// Replacement damage list.
    pub damages: Option<Vec<DamageDraft>>,
}

/// Customer verdict on one damage entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageVerdict {
    /// Repair approved.
    Approved,
    /// Repair rejected.
    Rejected,
}

impl From<DamageVerdict> for DamageStatus {
    fn from(value: DamageVerdict) -> Self {
        match value {
            DamageVerdict::Approved => Self::Approved,
            DamageVerdict::Rejected => Self::Rejected,
        }
    }
}

/// Verdict on one damage entry, identified by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DamageDecision {
    /// Damage entry identifier.
    pub id: String,
    /// Verdict.
    pub verdict: DamageVerdict,
    /// Optional customer note.
    pub note: Option<String>,
}

/// Validated customer review of a photo report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoReview {
    decisions: Vec<DamageDecision>,
    signature: Option<String>,
    reviewer_name: String,
}

impl PhotoReview {
    /// Validates a review. A blank reviewer name becomes `Customer`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Validation`] when a damage id appears
    /// more than once.
    pub fn new(
        decisions: Vec<DamageDecision>,
        signature: Option<String>,
        reviewer_name: Option<String>,
    ) -> Result<Self, WorkflowDomainError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = decisions.iter().find(|d| !seen.insert(d.id.as_str())) {
            return Err(WorkflowDomainError::validation(format!(
                "damage {} reviewed more than once",
                duplicate.id
            )));
        }
        let name = reviewer_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_REVIEWER_NAME.to_owned());
        Ok(Self {
            decisions,
            signature,
            reviewer_name: name,
        })
    }

    /// Returns the reviewer name.
    #[must_use]
    pub fn reviewer_name(&self) -> &str {
        &self.reviewer_name
    }
}

/// Approved and total damage counts after a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTally {
    /// Entries approved.
    pub approved_count: usize,
    /// Entries in the report.
    pub total_count: usize,
}

impl WorkflowRecord<PhotoReport> {
    /// Applies staff edits to a draft.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::NotEditable`] once the report left
    /// draft.
    pub fn update_draft(
        &mut self,
        update: DraftUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowDomainError> {
        if self.status != PhotoReportStatus::Draft {
            return Err(WorkflowDomainError::NotEditable {
                status: self.status.as_str(),
            });
        }
        let damages = update.damages.map(DamageDraft::into_entries).transpose()?;
        if let Some(contact) = update.contact {
            self.snapshot = contact;
        }
        if let Some(notes) = update.notes {
            self.details.notes = Some(notes);
        }
        if let Some(damages) = damages {
            self.items = damages;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Moves a draft to sent.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] unless the report
    /// is a draft.
    pub fn mark_sent(
        &mut self,
        by: StaffActor,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowDomainError> {
        self.transition(PhotoReportStatus::Sent, now)?;
        self.details.sms_sent = false;
        self.details.email_sent = false;
        self.mark_dispatched(by, now);
        Ok(())
    }

    /// Records which channels reached the customer.
    pub fn record_delivery(&mut self, sms_sent: bool, email_sent: bool, now: DateTime<Utc>) {
        self.details.sms_sent = sms_sent;
        self.details.email_sent = email_sent;
        self.updated_at = now;
    }

    /// Records the customer's review.
    ///
    /// Only the verdict and note are taken from each decision; descriptive
    /// fields and photos stay as stored.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::AlreadyResponded`] for a reviewed
    /// report, [`WorkflowDomainError::InvalidTransition`] for a draft and
    /// [`WorkflowDomainError::Validation`] unless every stored damage is
    /// decided exactly once.
    pub fn record_review(
        &mut self,
        review: PhotoReview,
        now: DateTime<Utc>,
    ) -> Result<ReviewTally, WorkflowDomainError> {
        if self.has_response() || self.status == PhotoReportStatus::Reviewed {
            return Err(WorkflowDomainError::AlreadyResponded);
        }
        let PhotoReview {
            decisions,
            signature,
            reviewer_name,
        } = review;
        let mut by_id: HashMap<String, DamageDecision> = decisions
            .into_iter()
            .map(|decision| (decision.id.clone(), decision))
            .collect();
        if by_id.len() != self.items.len()
            || self.items.iter().any(|damage| !by_id.contains_key(&damage.id))
        {
            return Err(WorkflowDomainError::validation(
                "every damage must be reviewed exactly once",
            ));
        }
        self.transition(PhotoReportStatus::Reviewed, now)?;
        for damage in &mut self.items {
            if let Some(decision) = by_id.remove(&damage.id) {
                damage.status = decision.verdict.into();
                damage.customer_note = decision.note;
            }
        }
        self.details.reviewer_name = Some(reviewer_name);
        self.details.reviewer_signature = signature;
        self.responded_at = Some(now);
        Ok(self.tally())
    }

    /// Returns to draft under a new token.
    ///
    /// The old token is retired, delivery flags and review fields are
    /// cleared and every damage goes back to pending.
    pub fn reset(&mut self, token: AccessToken, now: DateTime<Utc>) {
        self.rotate_token(token, now);
        self.status = PhotoReportStatus::Draft;
        self.sent_at = None;
        self.responded_at = None;
        self.details.sms_sent = false;
        self.details.email_sent = false;
        self.details.reviewer_name = None;
        self.details.reviewer_signature = None;
        for damage in &mut self.items {
            damage.status = DamageStatus::Pending;
            damage.customer_note = None;
        }
    }

    /// Counts approved damages.
    #[must_use]
    pub fn tally(&self) -> ReviewTally {
        ReviewTally {
            approved_count: self
                .items
                .iter()
                .filter(|damage| damage.status == DamageStatus::Approved)
                .count(),
            total_count: self.items.len(),
        }
    }
}

impl WorkflowDefinition for PhotoReport {
    const KIND: WorkflowKind = WorkflowKind::PhotoReport;

    type State = PhotoReportStatus;
    type Item = DamageEntry;
    type Snapshot = ReportContact;
    type Details = PhotoReportDetails;

    fn task_writes(_record: &WorkflowRecord<Self>, _event: WorkflowEvent) -> Vec<TaskFieldWrite> {
        Vec::new()
    }

    fn is_open(record: &WorkflowRecord<Self>, _now: DateTime<Utc>) -> bool {
        record.task_id.is_some()
            && matches!(
                record.status,
                PhotoReportStatus::Draft | PhotoReportStatus::Sent
            )
    }
}
