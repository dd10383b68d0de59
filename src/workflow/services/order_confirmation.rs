//! Order confirmation service.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::engine::{PublicLinks, Recipient, SendOutcome, WorkflowEngine, non_blank};
use super::{WorkflowServiceError, WorkflowServiceResult};
use crate::activity::domain::{ActivityAction, Actor, StaffActor};
use crate::notification::{
    domain::{DeliveryReport, OutboundMessage},
    services::{DispatchPlan, MessageTemplate},
};
use crate::task::domain::{Task, TaskId};
use crate::workflow::{
    domain::{
        NewWorkflow, OrderConfirmation, OrderConfirmationDetails, OrderConfirmationRecord,
        OrderConfirmationResponse, OrderConfirmationStatus, OrderOptions, OrderSnapshot,
        WorkflowEvent, WorkflowKind,
    },
    ports::{RecordGuard, WorkflowRepository},
};

const DEFAULT_RECIPIENT_NAME: &str = "Kunde";
const DEFAULT_RESPONDENT: &str = "Customer";

/// Staff request to send an order confirmation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOrderConfirmation {
    /// Task the order belongs to.
    pub task_id: TaskId,
    /// Line item options.
    pub options: OrderOptions,
}

/// Staff request to re-deliver the current link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResendOrderConfirmation {
    /// Task the order belongs to.
    pub task_id: TaskId,
    /// Send to this address instead of the task contact.
    pub override_email: Option<String>,
    /// Send to this number instead of the task contact.
    pub override_phone: Option<String>,
    /// Build the link on this base URL instead of the configured one.
    pub base_url: Option<String>,
}

/// Staff request to deliver the current link to a test address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestDelivery {
    /// Task the order belongs to.
    pub task_id: TaskId,
    /// Test email address; falls back to the task contact.
    pub email: Option<String>,
    /// Optional test phone number.
    pub phone: Option<String>,
    /// Build the link on this base URL instead of the configured one.
    pub base_url: Option<String>,
}

/// Result of a test delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDeliveryOutcome {
    /// Link that was sent.
    pub public_url: String,
    /// Per-channel delivery results.
    pub delivery: DeliveryReport,
    /// Resolved test recipient.
    pub sent_to: Recipient,
}

/// Sends, serves and finalises order confirmations.
#[derive(Clone)]
pub struct OrderConfirmationService {
    engine: Arc<WorkflowEngine>,
    repository: WorkflowRepository<OrderConfirmation>,
}

impl OrderConfirmationService {
    /// Creates the service.
    #[must_use]
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        let repository = engine.repository();
        Self { engine, repository }
    }

    /// Creates a confirmation for a task and delivers the link.
    ///
    /// Email is mandatory and checked before anything is stored; SMS is
    /// attempted when the contact has a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::PreconditionFailed`] without a
    /// contact email and [`WorkflowServiceError::AlreadyOpen`] while an
    /// earlier confirmation is still open.
    pub async fn send(
        &self,
        request: SendOrderConfirmation,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<SendOutcome<OrderConfirmation>> {
        let SendOrderConfirmation { task_id, options } = request;
        let task = self.engine.load_task(task_id).await?;
        self.engine
            .ensure_none_open(&self.repository, task_id)
            .await?;
        let recipient = self.resolve_for_send(&task).await?;
        let email = require_email(&recipient)?;

        let now = self.engine.now();
        let issued = self
            .engine
            .issuer()
            .issue(WorkflowKind::OrderConfirmation, Some(task_id));
        let public_url = self.engine.links().order_confirmation(&issued.token);
        let plan = self.plan(
            &task.address().one_line(),
            &recipient,
            &public_url,
            issued.expires_at,
            actor,
            false,
        )?;

        let mut record = OrderConfirmationRecord::new(
            NewWorkflow {
                token: issued.token,
                task_id: Some(task_id),
                status: OrderConfirmationStatus::Sent,
                items: options.line_items(),
                snapshot: snapshot_of(&task, &recipient),
                details: OrderConfirmationDetails {
                    options,
                    overall_accepted: None,
                },
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
        let lines: Vec<&str> = record
            .items()
            .iter()
            .map(|item| item.item_type.as_str())
            .collect();
        self.engine
            .record_activity(
                &record,
                ActivityAction::OrderConfirmationSent,
                format!(
                    "Order confirmation sent to {email}. Lines: {}",
                    lines.join(", ")
                ),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "order_confirmation",
            workflow_id = %record.id(),
            task_id = %task_id,
            token_fingerprint = %record.token().fingerprint(),
            sms_sent = delivery.sms_sent(),
            email_sent = delivery.email_sent(),
            "order confirmation sent"
        );
        Ok(SendOutcome {
            record,
            delivery,
            public_url,
        })
    }

    /// Resolves a token for the public page.
    ///
    /// A lapsed `sent` record is moved to `expired` on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] for unknown tokens and
    /// [`WorkflowServiceError::Expired`] past the expiry.
    pub async fn public_fetch(
        &self,
        token: &str,
    ) -> WorkflowServiceResult<OrderConfirmationRecord> {
        let record = self.resolve_token(token).await?;
        self.reject_if_expired(record).await
    }

    /// Records the customer's single response.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::AlreadyResponded`] on a second
    /// response, including one racing the first.
    pub async fn respond(
        &self,
        token: &str,
        response: &OrderConfirmationResponse,
    ) -> WorkflowServiceResult<OrderConfirmationRecord> {
        let mut record = self.reject_if_expired(self.resolve_token(token).await?).await?;
        if record.has_response() {
            return Err(WorkflowServiceError::AlreadyResponded);
        }
        let guard = RecordGuard::from_read(&record, &[OrderConfirmationStatus::Sent]).unresponded();
        let now = self.engine.now();
        record.record_response(response, now)?;
        self.engine
            .commit(&self.repository, &record, &guard)
            .await?;
        self.engine
            .project(&record, WorkflowEvent::Responded)
            .await?;

        let snapshot = record.snapshot();
        let respondent = non_blank(snapshot.contact_email.as_deref())
            .or_else(|| non_blank(snapshot.contact_name.as_deref()))
            .unwrap_or_else(|| DEFAULT_RESPONDENT.to_owned());
        self.engine
            .record_activity(
                &record,
                ActivityAction::OrderConfirmationResponse,
                format!(
                    "Customer responded to the order confirmation: {}",
                    record.answer_summary()
                ),
                Actor::external(respondent),
            )
            .await;
        info!(
            workflow_kind = "order_confirmation",
            workflow_id = %record.id(),
            task_id = ?record.task_id(),
            "order confirmation response recorded"
        );
        Ok(record)
    }

    /// Activates the task's latest confirmation.
    ///
    /// Moves the task into its active status bucket.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] when the task has no
    /// confirmation and a domain error unless the confirmation is `sent`
    /// or `response_received`.
    pub async fn activate(
        &self,
        task_id: TaskId,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<OrderConfirmationRecord> {
        let mut record = self.latest(task_id).await?;
        let now = self.engine.now();
        if record.effective_status(now) == OrderConfirmationStatus::Expired {
            return Err(WorkflowServiceError::Expired);
        }
        let guard = RecordGuard::as_read(&record);
        record.activate(actor.clone(), now)?;
        self.engine
            .commit(&self.repository, &record, &guard)
            .await?;
        self.engine
            .project(&record, WorkflowEvent::Finalized)
            .await?;
        self.engine
            .record_activity(
                &record,
                ActivityAction::OrderConfirmationActivated,
                "Order confirmation activated; task moved to planning".to_owned(),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "order_confirmation",
            workflow_id = %record.id(),
            task_id = %task_id,
            "order confirmation activated"
        );
        Ok(record)
    }

    /// Re-delivers the existing link without changing state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::Expired`] for a lapsed link and
    /// [`WorkflowServiceError::PreconditionFailed`] without an email.
    pub async fn resend(
        &self,
        request: ResendOrderConfirmation,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<SendOutcome<OrderConfirmation>> {
        let record = self.latest(request.task_id).await?;
        if record.effective_status(self.engine.now()) == OrderConfirmationStatus::Expired {
            return Err(WorkflowServiceError::Expired);
        }
        let task = self.engine.load_task(request.task_id).await?;
        let recipient = self.resolve_for_resend(&task, &request).await?;
        let email = require_email(&recipient)?;
        let public_url = self
            .links_for(request.base_url.as_deref())
            .order_confirmation(record.token());
        let plan = self.plan(
            &task.address().one_line(),
            &recipient,
            &public_url,
            record.expires_at(),
            actor,
            false,
        )?;
        let delivery = self
            .engine
            .dispatcher()
            .dispatch(plan, &WorkflowEngine::ledger_reference(&record))
            .await;
        self.engine
            .record_activity(
                &record,
                ActivityAction::OrderConfirmationResent,
                format!("Order confirmation re-sent to {email}"),
                Actor::Staff(actor.clone()),
            )
            .await;
        info!(
            workflow_kind = "order_confirmation",
            workflow_id = %record.id(),
            task_id = %request.task_id,
            sms_sent = delivery.sms_sent(),
            email_sent = delivery.email_sent(),
            "order confirmation re-sent"
        );
        Ok(SendOutcome {
            record,
            delivery,
            public_url,
        })
    }

    /// Delivers the task's current link to a staff test address.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowServiceError::NotFound`] when the task has no
    /// confirmation and [`WorkflowServiceError::PreconditionFailed`]
    /// without any email address.
    pub async fn test_delivery(
        &self,
        request: TestDelivery,
        actor: &StaffActor,
    ) -> WorkflowServiceResult<TestDeliveryOutcome> {
        let record = self.latest(request.task_id).await?;
        let task = self.engine.load_task(request.task_id).await?;
        let fallback = self.resolve_for_send(&task).await?;
        let recipient = Recipient {
            name: fallback.name,
            email: non_blank(request.email.as_deref()).or(fallback.email),
            phone: non_blank(request.phone.as_deref()),
        };
        let public_url = self
            .links_for(request.base_url.as_deref())
            .order_confirmation(record.token());
        let mut plan = self.plan(
            &task.address().one_line(),
            &recipient,
            &public_url,
            record.expires_at(),
            actor,
            true,
        )?;
        plan.sms = match recipient.phone.as_deref() {
            Some(phone) => Some(OutboundMessage::sms(
                phone,
                self.engine.render(
                    MessageTemplate::OrderConfirmationTestSms,
                    &json!({ "link": public_url }),
                )?,
            )?),
            None => None,
        };
        let delivery = self
            .engine
            .dispatcher()
            .dispatch(plan, &WorkflowEngine::ledger_reference(&record))
            .await;
        info!(
            workflow_kind = "order_confirmation",
            workflow_id = %record.id(),
            task_id = %request.task_id,
            staff_id = %actor.id,
            "order confirmation test delivery"
        );
        Ok(TestDeliveryOutcome {
            public_url,
            delivery,
            sent_to: recipient,
        })
    }

    /// Returns the task's latest confirmation, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn find_for_task(
        &self,
        task_id: TaskId,
    ) -> WorkflowServiceResult<Option<OrderConfirmationRecord>> {
        Ok(self
            .repository
            .list_for_task(task_id)
            .await?
            .into_iter()
            .next())
    }

    async fn latest(&self, task_id: TaskId) -> WorkflowServiceResult<OrderConfirmationRecord> {
        self.find_for_task(task_id).await?.ok_or_else(|| {
            WorkflowServiceError::NotFound(format!("order confirmation for task {task_id}"))
        })
    }

    async fn resolve_token(&self, token: &str) -> WorkflowServiceResult<OrderConfirmationRecord> {
        self.repository
            .find_by_token(token)
            .await?
            .ok_or_else(|| WorkflowServiceError::NotFound("order confirmation".to_owned()))
    }

    /// Fails with `Expired` past the expiry, persisting the transition
    /// when the record is still `sent`.
    async fn reject_if_expired(
        &self,
        mut record: OrderConfirmationRecord,
    ) -> WorkflowServiceResult<OrderConfirmationRecord> {
        let now = self.engine.now();
        if !record.is_expired(now) {
            return Ok(record);
        }
        if record.status() == OrderConfirmationStatus::Sent {
            let guard =
                RecordGuard::from_read(&record, &[OrderConfirmationStatus::Sent]).unresponded();
            record.expire(now)?;
            // A concurrent reader may have expired it first; either way the
            // link is dead.
            match self.engine.commit(&self.repository, &record, &guard).await {
                Ok(()) => {
                    self.engine.project(&record, WorkflowEvent::Expired).await?;
                    self.engine
                        .record_activity(
                            &record,
                            ActivityAction::OrderConfirmationExpired,
                            "Order confirmation link expired unanswered".to_owned(),
                            Actor::external(DEFAULT_RESPONDENT),
                        )
                        .await;
                    info!(
                        workflow_kind = "order_confirmation",
                        workflow_id = %record.id(),
                        task_id = ?record.task_id(),
                        "order confirmation expired"
                    );
                }
                Err(
                    WorkflowServiceError::Conflict { .. } | WorkflowServiceError::AlreadyResponded,
                ) => {}
                Err(err) => warn!(
                    workflow_kind = "order_confirmation",
                    workflow_id = %record.id(),
                    error = %err,
                    "failed to persist order confirmation expiry"
                ),
            }
        }
        Err(WorkflowServiceError::Expired)
    }

    fn links_for(&self, base_url: Option<&str>) -> PublicLinks {
        non_blank(base_url).map_or_else(
            || self.engine.links().clone(),
            |base| PublicLinks::new(&base),
        )
    }

    /// Directory contact fields win over the task's own contact fields.
    async fn resolve_for_send(&self, task: &Task) -> WorkflowServiceResult<Recipient> {
        let contact = task.contact();
        let mut recipient = Recipient {
            name: non_blank(contact.name.as_deref())
                .unwrap_or_else(|| DEFAULT_RECIPIENT_NAME.to_owned()),
            email: non_blank(contact.email.as_deref()),
            phone: non_blank(contact.phone.as_deref()),
        };
        if let Some(directory) = self.engine.directory_contact(task).await? {
            recipient.email = non_blank(directory.email.as_deref()).or(recipient.email);
            recipient.phone = non_blank(directory.phone.as_deref()).or(recipient.phone);
            if let Some(name) = non_blank(directory.name.as_deref()) {
                recipient.name = name;
            }
        }
        Ok(recipient)
    }

    /// Overrides win, then task fields; the directory only fills gaps when
    /// no email override was given.
    async fn resolve_for_resend(
        &self,
        task: &Task,
        request: &ResendOrderConfirmation,
    ) -> WorkflowServiceResult<Recipient> {
        let contact = task.contact();
        let override_email = non_blank(request.override_email.as_deref());
        let mut recipient = Recipient {
            name: non_blank(contact.name.as_deref())
                .unwrap_or_else(|| DEFAULT_RECIPIENT_NAME.to_owned()),
            email: override_email
                .clone()
                .or_else(|| non_blank(contact.email.as_deref())),
            phone: non_blank(request.override_phone.as_deref())
                .or_else(|| non_blank(contact.phone.as_deref())),
        };
        let fallback = if recipient.email.is_none() && override_email.is_none() {
            self.engine.directory_contact(task).await?
        } else {
            None
        };
        if let Some(directory) = fallback {
            recipient.email = non_blank(directory.email.as_deref());
            recipient.phone = recipient
                .phone
                .or_else(|| non_blank(directory.phone.as_deref()));
            if let Some(name) = non_blank(directory.name.as_deref()) {
                recipient.name = name;
            }
        }
        Ok(recipient)
    }

    fn plan(
        &self,
        address: &str,
        recipient: &Recipient,
        public_url: &str,
        expires_at: Option<DateTime<Utc>>,
        actor: &StaffActor,
        test: bool,
    ) -> WorkflowServiceResult<DispatchPlan> {
        let email = require_email(recipient)?;
        let context = json!({
            "recipient": recipient.name,
            "link": public_url,
            "address": address,
            "expires_at": expires_at.map(|at| at.to_rfc3339()),
            "sender": actor.name,
            "test": test,
        });
        let subject = self
            .engine
            .render(MessageTemplate::OrderConfirmationSubject, &context)?;
        let html = self
            .engine
            .render(MessageTemplate::OrderConfirmationEmail, &context)?;
        let sms = match recipient.phone.as_deref() {
            Some(phone) => Some(OutboundMessage::sms(
                phone,
                self.engine
                    .render(MessageTemplate::OrderConfirmationSms, &context)?,
            )?),
            None => None,
        };
        Ok(DispatchPlan {
            sms,
            email: Some(OutboundMessage::email(&email, subject, html)?),
        })
    }
}

fn require_email(recipient: &Recipient) -> WorkflowServiceResult<String> {
    recipient.email.clone().ok_or_else(|| {
        WorkflowServiceError::PreconditionFailed(
            "the task has no contact email; add a contact with an email or send to another address"
                .to_owned(),
        )
    })
}

fn snapshot_of(task: &Task, recipient: &Recipient) -> OrderSnapshot {
    let address = task.address();
    OrderSnapshot {
        address: address.street.clone(),
        postal_code: address.postal_code.clone(),
        city: address.city.clone(),
        company_name: task.company_name().map(str::to_owned),
        contact_name: Some(recipient.name.clone()),
        contact_email: recipient.email.clone(),
        task_number: task.task_number().map(str::to_owned),
        damages: task.damages().to_vec(),
    }
}
