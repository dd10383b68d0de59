//! Photo report service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::engine::{SendOutcome, WorkflowEngine, non_blank};
use super::{WorkflowServiceError, WorkflowServiceResult};
use crate::activity::domain::{ActivityAction, Actor, StaffActor};
use crate::notification::{
    domain::OutboundMessage,
    services::{DispatchPlan, MessageTemplate},
};
use crate::task::domain::{Task, TaskId};
use crate::workflow::{
    domain::{
        DamageDraft, DraftUpdate, NewWorkflow, PhotoReport, PhotoReportDetails, PhotoReportRecord,
        PhotoReportStatus, PhotoReview, ReportContact, ReviewTally, WorkflowEvent, WorkflowId,
        WorkflowKind,
    },
    ports::{RecordGuard, WorkflowRepository},
};

const DEFAULT_RECIPIENT_NAME: &str = "Kunde";

/// Staff request to create a draft report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePhotoReport {
    /// Task the report belongs to, if any.
    pub task_id: Option<TaskId>,
    /// Recipient and site fields; blanks are filled from the task.
    pub contact: ReportContact,
    /// Report notes.
    pub notes: Option<String>,
    /// Photographed damages.
    pub damages: Vec<DamageDraft>,
}

/// Task fields shown next to a report on the public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDisplay {
    /// Human task number.
    pub task_number: Option<String>,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Customer company name.
    pub company_name: Option<String>,
}

impl From<&Task> for TaskDisplay {
    fn from(task: &Task) -> Self {
        let address = task.address();
        Self {
            task_number: task.task_number().map(str::to_owned),
            address: address.street.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            company_name: task.company_name().map(str::to_owned),
        }
    }
}

/// A report resolved through its public token.
#[derive(Debug, Clone)]
pub struct PublicPhotoReport {
    /// The report.
    pub report: PhotoReportRecord,
    /// Display fields of the owning task.
    pub task: Option<TaskDisplay>,
}

/// Result of a customer review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewReceipt {
    /// Approved and total damage counts.
    pub tally: ReviewTally,
    /// When the review was stored.
    pub reviewed_at: DateTime<Utc>,
}

/// Drafts, sends and collects reviews of photo reports.
#[derive(Clone)]
pub struct PhotoReportService {
    engine: Arc<WorkflowEngine>,
    repository: WorkflowRepository<PhotoReport>,
}

impl PhotoReportService {
    /// Creates the service.
    #[must_use]
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        let repository = engine.repository();
        Self { engine, repository }
    }

    /// Stores a draft. Nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::TaskNotFound`] for an unknown task,
    /// [`WorkflowServiceError::AlreadyOpen`] while the task has an
    /// unreviewed report and a domain error for repeated damage ids.
    pub async fn create_draft(
        &self,
        request: CreatePhotoReport,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<PhotoReportRecord> {
        let CreatePhotoReport {
            task_id,
            contact,
            notes,
            damages,
        } = request;
        let items = DamageDraft::into_entries(damages)?;
        let task = match task_id {
            Some(id) => {
                let task = self.engine.load_task(id).await?;
                self.engine.ensure_none_open(&self.repository, id).await?;
                Some(task)
            }
            None => None,
        };
        let issued = self.engine.issuer().issue(WorkflowKind::PhotoReport, task_id);
        let record = PhotoReportRecord::new(
            NewWorkflow {
                token: issued.token,
                task_id,
                status: PhotoReportStatus::Draft,
                items,
                snapshot: fill_contact(contact, task.as_ref()),
                details: PhotoReportDetails {
                    notes: non_blank(notes.as_deref()),
                    ..PhotoReportDetails::default()
                },
                expires_at: issued.expires_at,
                created_by: actor.clone(),
            },
            self.engine.now(),
        );
        self.repository.insert(&record).await?;
        self.engine
            .record_activity(
                &record,
                ActivityAction::PhotoReportCreated,
                format!("Photo report drafted with {} damages", record.items().len()),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "photo_report",
            workflow_id = %record.id(),
            task_id = ?task_id,
            "photo report drafted"
        );
        Ok(record)
    }

    /// Loads a report by id.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] for an unknown id.
    pub async fn get(&self, id: WorkflowId) -> WorkflowServiceResult<PhotoReportRecord> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkflowServiceError::NotFound(format!("photo report {id}")))
    }

    /// Lists a task's reports, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_for_task(
        &self,
        task_id: TaskId,
    ) -> WorkflowServiceResult<Vec<PhotoReportRecord>> {
        Ok(self.repository.list_for_task(task_id).await?)
    }

    /// Applies staff edits to a draft.
    ///
    /// # Errors
    ///
    /// Returns a domain error once the report left draft and
    /// [`WorkflowServiceError::Conflict`] when it left draft concurrently.
    pub async fn update_draft(
        &self,
        id: WorkflowId,
        update: DraftUpdate,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<PhotoReportRecord> {
        let mut record = self.get(id).await?;
        let guard = RecordGuard::from_read(&record, &[PhotoReportStatus::Draft]);
        record.update_draft(update, self.engine.now())?;
        self.engine
            .commit(&self.repository, &record, &guard)
            .await?;
        self.engine
            .record_activity(
                &record,
                ActivityAction::PhotoReportUpdated,
                "Photo report draft updated".to_owned(),
                Actor::Staff(actor.clone()),
            )
            .await;
        Ok(record)
    }

    /// Sends a draft over SMS and email.
    ///
    /// The draft-to-sent transition is claimed before anything is
    /// delivered, so concurrent sends message the customer once. The
    /// per-channel flags are written after delivery.
    ///
    /// # Errors
    ///
    /// Returns a domain error unless the report is a draft.
    pub async fn send(
        &self,
        id: WorkflowId,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<SendOutcome<PhotoReport>> {
        let mut record = self.get(id).await?;
        let claim = RecordGuard::from_read(&record, &[PhotoReportStatus::Draft]);
        record.mark_sent(actor.clone(), self.engine.now())?;
        self.engine
            .commit(&self.repository, &record, &claim)
            .await?;

        let public_url = self.engine.links().photo_report(record.token());
        let plan = self.plan(&record, &public_url)?;
        let delivery = self
            .engine
            .dispatcher()
            .dispatch(plan, &WorkflowEngine::ledger_reference(&record))
            .await;
        let flags = RecordGuard::from_read(&record, &[PhotoReportStatus::Sent]).unresponded();
        record.record_delivery(delivery.sms_sent(), delivery.email_sent(), self.engine.now());
        if let Err(err) = self.engine.commit(&self.repository, &record, &flags).await {
            warn!(
                workflow_kind = "photo_report",
                workflow_id = %record.id(),
                error = %err,
                "photo report changed before delivery flags were stored"
            );
        }

        self.engine
            .record_activity(
                &record,
                ActivityAction::PhotoReportSent,
                format!(
                    "Photo report sent. SMS: {}. Email: {}",
                    delivery.sms.label(),
                    delivery.email.label()
                ),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "photo_report",
            workflow_id = %record.id(),
            task_id = ?record.task_id(),
            token_fingerprint = %record.token().fingerprint(),
            sms_sent = delivery.sms_sent(),
            email_sent = delivery.email_sent(),
            "photo report sent"
        );
        Ok(SendOutcome {
            record,
            delivery,
            public_url,
        })
    }

    /// Resolves a token into the report and its task display fields.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] for unknown or retired
    /// tokens.
    pub async fn public_fetch(&self, token: &str) -> WorkflowServiceResult<PublicPhotoReport> {
        let report = self.resolve_token(token).await?;
        let task = match report.task_id() {
            Some(task_id) => self
                .engine
                .find_task(task_id)
                .await?
                .as_ref()
                .map(TaskDisplay::from),
            None => None,
        };
        Ok(PublicPhotoReport { report, task })
    }

    /// Stores the customer's review.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::AlreadyResponded`] for a reviewed
    /// report and a domain error when the decisions do not cover every
    /// damage exactly once.
    pub async fn submit_review(
        &self,
        token: &str,
        review: PhotoReview,
    ) -> WorkflowServiceResult<ReviewReceipt> {
        let mut record = self.resolve_token(token).await?;
        if record.has_response() || record.status() == PhotoReportStatus::Reviewed {
            return Err(WorkflowServiceError::AlreadyResponded);
        }
        let guard = RecordGuard::from_read(&record, &[PhotoReportStatus::Sent]).unresponded();
        let reviewer = review.reviewer_name().to_owned();
        let now = self.engine.now();
        let tally = record.record_review(review, now)?;
        self.engine
            .commit(&self.repository, &record, &guard)
            .await?;
        self.engine
            .project(&record, WorkflowEvent::Responded)
            .await?;
        self.engine
            .record_activity(
                &record,
                ActivityAction::PhotoReportReviewed,
                format!(
                    "Photo report reviewed: {}/{} damages approved",
                    tally.approved_count, tally.total_count
                ),
                Actor::external(reviewer),
            )
            .await;
        info!(
            workflow_kind = "photo_report",
            workflow_id = %record.id(),
            approved = tally.approved_count,
            total = tally.total_count,
            "photo report reviewed"
        );
        Ok(ReviewReceipt {
            tally,
            reviewed_at: now,
        })
    }

    /// Returns a report to draft under a new token.
    ///
    /// The new token is installed by the same conditional write that
    /// clears the review, guarded on the old token.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] for an unknown id and
    /// [`WorkflowServiceError::Conflict`] when the report changed
    /// concurrently.
    pub async fn reset(
        &self,
        id: WorkflowId,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<PhotoReportRecord> {
        let mut record = self.get(id).await?;
        let guard = RecordGuard::as_read(&record);
        let token = self.engine.issuer().reissue(WorkflowKind::PhotoReport);
        record.reset(token, self.engine.now());
        self.engine
            .commit(&self.repository, &record, &guard)
            .await?;
        self.engine
            .record_activity(
                &record,
                ActivityAction::PhotoReportReset,
                "Photo report reset to draft with a new link".to_owned(),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "photo_report",
            workflow_id = %record.id(),
            token_fingerprint = %record.token().fingerprint(),
            "photo report reset"
        );
        Ok(record)
    }

    async fn resolve_token(&self, token: &str) -> WorkflowServiceResult<PhotoReportRecord> {
        self.repository
            .find_by_token(token)
            .await?
            .ok_or_else(|| WorkflowServiceError::NotFound("photo report".to_owned()))
    }

    fn plan(
        &self,
        record: &PhotoReportRecord,
        public_url: &str,
    ) -> WorkflowServiceResult<DispatchPlan> {
        let contact = record.snapshot();
        let context = json!({
            "recipient": non_blank(contact.contact_name.as_deref())
                .unwrap_or_else(|| DEFAULT_RECIPIENT_NAME.to_owned()),
            "link": public_url,
            "address": contact.address.as_deref().unwrap_or_default(),
            "damage_count": record.items().len(),
        });
        let sms = match non_blank(contact.contact_phone.as_deref()) {
            Some(phone) => Some(OutboundMessage::sms(
                &phone,
                self.engine.render(MessageTemplate::PhotoReportSms, &context)?,
            )?),
            None => None,
        };
        let email = match non_blank(contact.contact_email.as_deref()) {
            Some(address) => Some(OutboundMessage::email(
                &address,
                self.engine
                    .render(MessageTemplate::PhotoReportSubject, &context)?,
                self.engine.render(MessageTemplate::PhotoReportEmail, &context)?,
            )?),
            None => None,
        };
        Ok(DispatchPlan { sms, email })
    }
}

/// Fills blank contact fields from the task: its contact first, then the
/// primary owner.
fn fill_contact(contact: ReportContact, source: Option<&Task>) -> ReportContact {
    let ReportContact {
        contact_name,
        contact_email,
        contact_phone,
        address,
        postal_code,
        city,
    } = contact;
    let Some(task) = source else {
        return ReportContact {
            contact_name: non_blank(contact_name.as_deref()),
            contact_email: non_blank(contact_email.as_deref()),
            contact_phone: non_blank(contact_phone.as_deref()),
            address: non_blank(address.as_deref()),
            postal_code: non_blank(postal_code.as_deref()),
            city: non_blank(city.as_deref()),
        };
    };
    let task_contact = task.contact();
    let owner = task.primary_owner();
    let site = task.address();
    ReportContact {
        contact_name: non_blank(contact_name.as_deref())
            .or_else(|| non_blank(task_contact.name.as_deref()))
            .or_else(|| owner.and_then(|o| non_blank(o.name.as_deref()))),
        contact_email: non_blank(contact_email.as_deref())
            .or_else(|| non_blank(task_contact.email.as_deref())),
        contact_phone: non_blank(contact_phone.as_deref())
            .or_else(|| non_blank(task_contact.phone.as_deref()))
            .or_else(|| owner.and_then(|o| non_blank(o.phone.as_deref()))),
        address: non_blank(address.as_deref()).or_else(|| non_blank(Some(site.street.as_str()))),
        postal_code: non_blank(postal_code.as_deref())
            .or_else(|| non_blank(Some(site.postal_code.as_str()))),
        city: non_blank(city.as_deref()).or_else(|| non_blank(Some(site.city.as_str()))),
    }
}
