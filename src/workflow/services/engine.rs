//! Collaborators shared by the workflow services.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use super::{TaskProjector, TokenIssuer, WorkflowServiceError, WorkflowServiceResult};
use crate::activity::{
    domain::{ActivityAction, ActivityEntry, Actor, EntityType},
    ports::ActivityLog,
};
use crate::notification::{
    domain::{DeliveryReport, LedgerReference},
    services::{MessageTemplate, MessageTemplates, NotificationDispatcher},
};
use crate::task::{
    domain::{Contact, Task, TaskId},
    ports::{ContactDirectory, TaskStore},
};
use crate::workflow::{
    domain::{
        AccessToken, CommunicationType, WorkflowDefinition, WorkflowEvent, WorkflowRecord,
        WorkflowState,
    },
    ports::{RecordGuard, WorkflowRepository, WorkflowStore},
};

/// Builds the public links handed to external parties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicLinks {
    base_url: String,
}

impl PublicLinks {
    /// Creates links rooted at `base_url`; a trailing slash is dropped.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Order confirmation page, e.g. `https://portal/confirm/{token}`.
    #[must_use]
    pub fn order_confirmation(&self, token: &AccessToken) -> String {
        format!("{}/confirm/{}", self.base_url, token.as_str())
    }

    /// Property-owner page; indoor scheduling opens the date picker.
    #[must_use]
    pub fn bygherre(&self, communication_type: CommunicationType, token: &AccessToken) -> String {
        format!(
            "{}/bygherre/{}/{}",
            self.base_url,
            communication_type.public_path(),
            token.as_str()
        )
    }

    /// Photo report review page.
    #[must_use]
    pub fn photo_report(&self, token: &AccessToken) -> String {
        format!("{}/fotorapport/{}", self.base_url, token.as_str())
    }
}

/// Result of creating or re-sending a workflow link.
#[derive(Debug, Clone)]
pub struct SendOutcome<K: WorkflowDefinition> {
    /// The record as persisted.
    pub record: WorkflowRecord<K>,
    /// Per-channel delivery results.
    pub delivery: DeliveryReport,
    /// Link sent to the external party.
    pub public_url: String,
}

/// Resolved message recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    /// Greeting name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

/// Parameter object for [`WorkflowEngine::new`].
pub struct EngineParts {
    /// Workflow record persistence.
    pub store: Arc<dyn WorkflowStore>,
    /// Task reads and mirror writes.
    pub tasks: Arc<dyn TaskStore>,
    /// Contact directory.
    pub contacts: Arc<dyn ContactDirectory>,
    /// Business-event log.
    pub activity: Arc<dyn ActivityLog>,
    /// Time source.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Token issuer.
    pub issuer: TokenIssuer,
    /// Notification dispatcher.
    pub dispatcher: NotificationDispatcher,
    /// Message templates.
    pub templates: Arc<MessageTemplates>,
    /// Public link builder.
    pub links: PublicLinks,
}

/// Shared scaffolding behind the three workflow services.
#[derive(Clone)]
pub struct WorkflowEngine {
    store: Arc<dyn WorkflowStore>,
    tasks: Arc<dyn TaskStore>,
    contacts: Arc<dyn ContactDirectory>,
    activity: Arc<dyn ActivityLog>,
    clock: Arc<dyn Clock + Send + Sync>,
    issuer: TokenIssuer,
    dispatcher: NotificationDispatcher,
    templates: Arc<MessageTemplates>,
    links: PublicLinks,
    projector: TaskProjector,
}

impl WorkflowEngine {
    /// Assembles the engine.
    #[must_use]
    pub fn new(parts: EngineParts) -> Self {
        let projector = TaskProjector::new(Arc::clone(&parts.tasks), Arc::clone(&parts.clock));
        Self {
            store: parts.store,
            tasks: parts.tasks,
            contacts: parts.contacts,
            activity: parts.activity,
            clock: parts.clock,
            issuer: parts.issuer,
            dispatcher: parts.dispatcher,
            templates: parts.templates,
            links: parts.links,
            projector,
        }
    }

    /// Returns the public link builder.
    #[must_use]
    pub const fn links(&self) -> &PublicLinks {
        &self.links
    }

    pub(super) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub(super) const fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub(super) const fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub(super) fn repository<K: WorkflowDefinition>(&self) -> WorkflowRepository<K> {
        WorkflowRepository::new(Arc::clone(&self.store))
    }

    pub(super) fn render<S: Serialize>(
        &self,
        template: MessageTemplate,
        context: &S,
    ) -> WorkflowServiceResult<String> {
        Ok(self.templates.render(template, context)?)
    }

    pub(super) async fn find_task(&self, task_id: TaskId) -> WorkflowServiceResult<Option<Task>> {
        Ok(self.tasks.find_by_id(task_id).await?)
    }

    pub(super) async fn load_task(&self, task_id: TaskId) -> WorkflowServiceResult<Task> {
        self.find_task(task_id)
            .await?
            .ok_or(WorkflowServiceError::TaskNotFound(task_id))
    }

    pub(super) async fn directory_contact(
        &self,
        task: &Task,
    ) -> WorkflowServiceResult<Option<Contact>> {
        match task.contact().contact_id {
            Some(contact_id) => Ok(self.contacts.find_contact(contact_id).await?),
            None => Ok(None),
        }
    }

    /// Refuses to create a record while another of the kind is open.
    pub(super) async fn ensure_none_open<K: WorkflowDefinition>(
        &self,
        repository: &WorkflowRepository<K>,
        task_id: TaskId,
    ) -> WorkflowServiceResult<()> {
        let now = self.now();
        let open = repository
            .list_for_task(task_id)
            .await?
            .into_iter()
            .find(|record| record.is_open(now));
        match open {
            Some(existing) => Err(WorkflowServiceError::AlreadyOpen {
                kind: K::KIND,
                existing: existing.id(),
            }),
            None => Ok(()),
        }
    }

    /// Persists a state change through a conditional write.
    pub(super) async fn commit<K: WorkflowDefinition>(
        &self,
        repository: &WorkflowRepository<K>,
        record: &WorkflowRecord<K>,
        guard: &RecordGuard<K>,
    ) -> WorkflowServiceResult<()> {
        repository.replace_if(record, guard).await?;
        Ok(())
    }

    pub(super) async fn project<K: WorkflowDefinition>(
        &self,
        record: &WorkflowRecord<K>,
        event: WorkflowEvent,
    ) -> WorkflowServiceResult<()> {
        self.projector.project(record, event).await?;
        Ok(())
    }

    /// Appends a business event. Failures are logged, never returned.
    pub(super) async fn record_activity<K: WorkflowDefinition>(
        &self,
        record: &WorkflowRecord<K>,
        action: ActivityAction,
        description: String,
        actor: Actor,
    ) {
        let now = self.now();
        let entry = match record.task_id() {
            Some(task_id) => ActivityEntry::for_task(task_id, action, description, actor, now),
            None => ActivityEntry::for_entity(
                EntityType::PhotoReport,
                record.id().into_inner(),
                action,
                description,
                actor,
                now,
            ),
        }
        .with_details(json!({
            "workflowId": record.id(),
            "workflowKind": K::KIND.as_str(),
            "status": record.status().as_str(),
        }));
        if let Err(err) = self.activity.append(&entry).await {
            error!(
                workflow_kind = K::KIND.as_str(),
                workflow_id = %record.id(),
                action = action.as_str(),
                error = %err,
                "failed to record activity"
            );
        }
    }

    pub(super) fn ledger_reference<K: WorkflowDefinition>(
        record: &WorkflowRecord<K>,
    ) -> LedgerReference {
        LedgerReference::workflow(
            record.task_id(),
            record.id().into_inner(),
            K::KIND.path_segment(),
        )
    }
}

/// Trims a field and drops it when blank.
pub(super) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}
