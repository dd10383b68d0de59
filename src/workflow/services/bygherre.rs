//! Property-owner scheduling service.
//!
//! Owners are reached by SMS only.

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

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
        Bygherre, BygherreAnswer, BygherreDetails, BygherrePublicView, BygherreRecord,
        BygherreSnapshot, BygherreStatus, CommunicationType, NewWorkflow, ProposedSlot,
        WorkflowEvent, WorkflowId, WorkflowKind,
    },
    ports::{RecordGuard, WorkflowRepository},
};

const DEFAULT_OWNER_NAME: &str = "Bygherre";

/// Staff request to message a task's property owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendBygherre {
    /// Task the visit belongs to.
    pub task_id: TaskId,
    /// What the owner is asked to do.
    pub communication_type: CommunicationType,
    /// Proposed visit slots, in the order shown to the owner.
    pub proposed_dates: Vec<ProposedSlot>,
    /// Optional staff message.
    pub message: Option<String>,
}

/// Staff choice for the final visit confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmFinal {
    /// Confirmed date; defaults to the owner's first selection.
    pub confirmed_date: Option<NaiveDate>,
    /// Confirmed time slot; defaults to the slot proposed for the date.
    pub confirmed_time_slot: Option<String>,
}

/// Sends, serves and finalises property-owner communications.
#[derive(Clone)]
pub struct BygherreService {
    engine: Arc<WorkflowEngine>,
    repository: WorkflowRepository<Bygherre>,
}

impl BygherreService {
    /// Creates the service.
    #[must_use]
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        let repository = engine.repository();
        Self { engine, repository }
    }

    /// Creates a communication and texts the owner.
    ///
    /// The owner's first phone number is used, falling back to the second
    /// owner. Without any number the record is still created and the SMS
    /// is reported as skipped.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the proposed slots do not fit the
    /// type and [`WorkflowServiceError::AlreadyOpen`] while an earlier
    /// scheduling request is unanswered.
    pub async fn send(
        &self,
        request: SendBygherre,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<SendOutcome<Bygherre>> {
        let SendBygherre {
            task_id,
            communication_type,
            proposed_dates,
            message,
        } = request;
        communication_type.validate_slots(&proposed_dates)?;
        let task = self.engine.load_task(task_id).await?;
        if communication_type.expects_response() {
            self.engine
                .ensure_none_open(&self.repository, task_id)
                .await?;
        }

        let now = self.engine.now();
        let issued = self
            .engine
            .issuer()
            .issue(WorkflowKind::Bygherre, Some(task_id));
        let public_url = self.engine.links().bygherre(communication_type, &issued.token);
        let snapshot = snapshot_of(&task);
        let template = match communication_type {
            CommunicationType::ConfirmTask => MessageTemplate::BygherreConfirmTaskSms,
            CommunicationType::ScheduleOutdoor => MessageTemplate::BygherreOutdoorSms,
            CommunicationType::ScheduleIndoor => MessageTemplate::BygherreIndoorSms,
        };
        let body = self.engine.render(
            template,
            &json!({
                "recipient": owner_name(&snapshot),
                "address": task.address().one_line(),
                "link": public_url,
                "dates": proposed_dates,
            }),
        )?;
        let plan = DispatchPlan {
            sms: match snapshot.owner_phone.as_deref() {
                Some(phone) => Some(OutboundMessage::sms(phone, body)?),
                None => None,
            },
            email: None,
        };

        let mut record = BygherreRecord::new(
            NewWorkflow {
                token: issued.token,
                task_id: Some(task_id),
                status: BygherreStatus::Sent,
                items: proposed_dates,
                snapshot,
                details: BygherreDetails::new(communication_type, message),
                expires_at: issued.expires_at,
                created_by: actor.clone(),
            },
            now,
        );
        record.mark_dispatched(actor.clone(), now);
        self.repository.insert(&record).await?;
        self.engine.project(&record, WorkflowEvent::Sent).await?;

        let delivery = self
            .engine
            .dispatcher()
            .dispatch(plan, &WorkflowEngine::ledger_reference(&record))
            .await;
        self.engine
            .record_activity(
                &record,
                ActivityAction::BygherreSmsSent,
                format!(
                    "Property owner message ({}) {}",
                    communication_type.as_str(),
                    delivery.sms.label()
                ),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "bygherre",
            workflow_id = %record.id(),
            task_id = %task_id,
            communication_type = communication_type.as_str(),
            token_fingerprint = %record.token().fingerprint(),
            sms_sent = delivery.sms_sent(),
            "property owner message sent"
        );
        Ok(SendOutcome {
            record,
            delivery,
            public_url,
        })
    }

    /// Resolves a token into the narrow public view.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] for unknown tokens.
    pub async fn public_fetch(&self, token: &str) -> WorkflowServiceResult<BygherrePublicView> {
        Ok(self.resolve_token(token).await?.public_view())
    }

    /// Records the owner's single answer.
    ///
    /// Clears the task's pending flag and, when the answer settles a
    /// single slot, writes the confirmed visit onto the task directly.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::AlreadyResponded`] on a second
    /// answer and a domain error for invalid selections.
    pub async fn respond(
        &self,
        token: &str,
        answer: BygherreAnswer,
    ) -> WorkflowServiceResult<BygherreRecord> {
        let mut record = self.resolve_token(token).await?;
        if record.has_response() {
            return Err(WorkflowServiceError::AlreadyResponded);
        }
        let guard = RecordGuard::from_read(&record, &[BygherreStatus::Sent]).unresponded();
        record.record_response(answer, self.engine.now())?;
        self.engine
            .commit(&self.repository, &record, &guard)
            .await?;
        self.engine
            .project(&record, WorkflowEvent::Responded)
            .await?;

        let snapshot = record.snapshot();
        let respondent = non_blank(snapshot.owner_name.as_deref())
            .or_else(|| non_blank(snapshot.owner_phone.as_deref()))
            .unwrap_or_else(|| DEFAULT_OWNER_NAME.to_owned());
        let verdict = if record.status() == BygherreStatus::Accepted {
            "confirmed"
        } else {
            "declined"
        };
        let settled = record
            .settled_visit()
            .map(|visit| format!(" for {} {}", visit.date, visit.time_slot))
            .unwrap_or_default();
        self.engine
            .record_activity(
                &record,
                ActivityAction::BygherreResponse,
                format!("Property owner {verdict}{settled}"),
                Actor::external(respondent),
            )
            .await;
        info!(
            workflow_kind = "bygherre",
            workflow_id = %record.id(),
            task_id = ?record.task_id(),
            verdict,
            "property owner response recorded"
        );
        Ok(record)
    }

    /// Fixes the indoor visit slot and texts the final confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] for an unknown record and
    /// a domain error for other types, repeated confirmations or when no
    /// slot can be determined.
    pub async fn confirm_final(
        &self,
        id: WorkflowId,
        request: ConfirmFinal,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<SendOutcome<Bygherre>> {
        let mut record = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkflowServiceError::NotFound(format!("property owner message {id}")))?;
        let guard = RecordGuard::as_read(&record);
        let visit = record.confirm_final(
            request.confirmed_date,
            request.confirmed_time_slot,
            actor.clone(),
            self.engine.now(),
        )?;
        self.engine
            .commit(&self.repository, &record, &guard)
            .await?;
        self.engine
            .project(&record, WorkflowEvent::Finalized)
            .await?;

        let snapshot = record.snapshot();
        let address = format!(
            "{}, {} {}",
            snapshot.address, snapshot.postal_code, snapshot.city
        );
        let body = self.engine.render(
            MessageTemplate::BygherreFinalSms,
            &json!({
                "recipient": owner_name(snapshot),
                "address": address.trim(),
                "date": visit.date,
                "time_slot": visit.time_slot,
            }),
        )?;
        let plan = DispatchPlan {
            sms: match snapshot.owner_phone.as_deref() {
                Some(phone) => Some(OutboundMessage::sms(phone, body)?),
                None => None,
            },
            email: None,
        };
        let delivery = self
            .engine
            .dispatcher()
            .dispatch(plan, &WorkflowEngine::ledger_reference(&record))
            .await;
        self.engine
            .record_activity(
                &record,
                ActivityAction::BygherreFinalConfirmation,
                format!(
                    "Final visit confirmation for {} {} {}",
                    visit.date,
                    visit.time_slot,
                    delivery.sms.label()
                ),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "bygherre",
            workflow_id = %record.id(),
            task_id = ?record.task_id(),
            "property owner visit confirmed"
        );
        let public_url = self
            .engine
            .links()
            .bygherre(record.communication_type(), record.token());
        Ok(SendOutcome {
            record,
            delivery,
            public_url,
        })
    }

    /// Lists a task's communications, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_for_task(
        &self,
        task_id: TaskId,
    ) -> WorkflowServiceResult<Vec<BygherreRecord>> {
        Ok(self.repository.list_for_task(task_id).await?)
    }

    async fn resolve_token(&self, token: &str) -> WorkflowServiceResult<BygherreRecord> {
        self.repository
            .find_by_token(token)
            .await?
            .ok_or_else(|| WorkflowServiceError::NotFound("property owner message".to_owned()))
    }
}

fn owner_name(snapshot: &BygherreSnapshot) -> String {
    non_blank(snapshot.owner_name.as_deref()).unwrap_or_else(|| DEFAULT_OWNER_NAME.to_owned())
}

fn snapshot_of(task: &Task) -> BygherreSnapshot {
    let address = task.address();
    let owner = task.primary_owner();
    BygherreSnapshot {
        address: address.street.clone(),
        postal_code: address.postal_code.clone(),
        city: address.city.clone(),
        company_name: task.company_name().map(str::to_owned),
        owner_name: owner.and_then(|o| non_blank(o.name.as_deref())),
        owner_phone: task.owner_phone().map(str::to_owned),
        owner_email: owner.and_then(|o| non_blank(o.email.as_deref())),
        task_summary: task.summary().map(str::to_owned),
    }
}
