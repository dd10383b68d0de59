//! Shared fixtures for workflow service tests.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::activity::{adapters::memory::InMemoryActivityLog, domain::StaffActor};
use crate::notification::{
    adapters::memory::{InMemoryLedger, RecordingEmailProvider, RecordingSmsProvider},
    services::{DispatcherConfig, MessageTemplates, NotificationDispatcher},
};
use crate::task::{
    adapters::memory::{InMemoryContactDirectory, InMemoryTaskStore},
    domain::{
        ContactSnapshot, PersistedTaskData, PropertyOwner, SiteAddress, Task, TaskDamage, TaskId,
        TaskStatus,
    },
};
use crate::workflow::{
    adapters::memory::InMemoryWorkflowStore,
    domain::{AccessToken, WorkflowId, WorkflowKind},
    ports::{StoredWorkflow, UpdateGuard, WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
    services::{
        BygherreService, EngineParts, ExpiryPolicy, OrderConfirmationService, PhotoReportService,
        PublicLinks, TokenIssuer, TokenSource, WorkflowEngine,
    },
};

pub(super) const BASE_URL: &str = "https://portal.example.com";

/// Clock that only moves when told to.
pub(super) struct TestClock {
    now: RwLock<DateTime<Utc>>,
}

impl TestClock {
    pub(super) fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub(super) fn advance(&self, by: TimeDelta) {
        let mut now = self.now.write().expect("clock lock");
        *now += by;
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock")
    }
}

/// Hands out `token-1`, `token-2`, ...
#[derive(Default)]
pub(super) struct SequentialTokens {
    next: AtomicUsize,
}

impl TokenSource for SequentialTokens {
    fn generate(&self) -> AccessToken {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        AccessToken::new(format!("token-{n}"))
    }
}

type QueuedWrite = Pin<Box<dyn Future<Output = ()> + Send>>;

/// In-memory store that can run an action just before the next
/// conditional write, or fail that write outright.
pub(super) struct ScriptedStore {
    inner: Arc<InMemoryWorkflowStore>,
    before_write: Mutex<Option<QueuedWrite>>,
    fail_write: AtomicBool,
}

impl ScriptedStore {
    fn new(inner: Arc<InMemoryWorkflowStore>) -> Self {
        Self {
            inner,
            before_write: Mutex::new(None),
            fail_write: AtomicBool::new(false),
        }
    }

    /// Runs `action` to completion when the next conditional write arrives,
    /// after the writer read the record and before its write lands.
    pub(super) fn before_next_write(&self, action: impl Future<Output = ()> + Send + 'static) {
        *self.before_write.lock().expect("write hook lock") = Some(Box::pin(action));
    }

    /// Fails the next conditional write with a persistence error.
    pub(super) fn fail_next_write(&self) {
        self.fail_write.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl WorkflowStore for ScriptedStore {
    async fn insert(&self, record: &StoredWorkflow) -> WorkflowStoreResult<()> {
        self.inner.insert(record).await
    }

    async fn find_by_id(
        &self,
        kind: WorkflowKind,
        id: WorkflowId,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>> {
        self.inner.find_by_id(kind, id).await
    }

    async fn find_by_token(
        &self,
        kind: WorkflowKind,
        token: &str,
    ) -> WorkflowStoreResult<Option<StoredWorkflow>> {
        self.inner.find_by_token(kind, token).await
    }

    async fn list_for_task(
        &self,
        kind: WorkflowKind,
        task_id: TaskId,
    ) -> WorkflowStoreResult<Vec<StoredWorkflow>> {
        self.inner.list_for_task(kind, task_id).await
    }

    async fn replace_if(
        &self,
        record: &StoredWorkflow,
        guard: &UpdateGuard,
    ) -> WorkflowStoreResult<()> {
        if self.fail_write.swap(false, Ordering::SeqCst) {
            return Err(WorkflowStoreError::persistence(std::io::Error::other(
                "database unavailable",
            )));
        }
        let queued = self.before_write.lock().expect("write hook lock").take();
        if let Some(action) = queued {
            action.await;
        }
        self.inner.replace_if(record, guard).await
    }
}

/// Engine wired to in-memory adapters, with handles for assertions.
pub(super) struct Harness {
    pub clock: Arc<TestClock>,
    pub tasks: Arc<InMemoryTaskStore>,
    pub contacts: Arc<InMemoryContactDirectory>,
    pub store: Arc<InMemoryWorkflowStore>,
    pub writes: Arc<ScriptedStore>,
    pub activity: Arc<InMemoryActivityLog>,
    pub ledger: Arc<InMemoryLedger>,
    pub sms: RecordingSmsProvider,
    pub email: RecordingEmailProvider,
    pub engine: Arc<WorkflowEngine>,
}

impl Harness {
    pub(super) fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .expect("valid start time");
        let clock = Arc::new(TestClock::starting_at(start));
        let tasks = Arc::new(InMemoryTaskStore::new());
        let contacts = Arc::new(InMemoryContactDirectory::new());
        let store = Arc::new(InMemoryWorkflowStore::new());
        let writes = Arc::new(ScriptedStore::new(store.clone()));
        let activity = Arc::new(InMemoryActivityLog::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let sms = RecordingSmsProvider::new();
        let email = RecordingEmailProvider::new();
        let dispatcher = NotificationDispatcher::new(
            Arc::new(sms.clone()),
            Arc::new(email.clone()),
            ledger.clone(),
            clock.clone(),
            DispatcherConfig::default(),
        );
        let engine = Arc::new(WorkflowEngine::new(EngineParts {
            store: writes.clone(),
            tasks: tasks.clone(),
            contacts: contacts.clone(),
            activity: activity.clone(),
            clock: clock.clone(),
            issuer: TokenIssuer::new(
                Arc::new(SequentialTokens::default()),
                clock.clone(),
                ExpiryPolicy::default(),
            ),
            dispatcher,
            templates: Arc::new(MessageTemplates::new("SMARTREP").expect("templates parse")),
            links: PublicLinks::new(BASE_URL),
        }));
        Self {
            clock,
            tasks,
            contacts,
            store,
            writes,
            activity,
            ledger,
            sms,
            email,
            engine,
        }
    }

    pub(super) fn order_confirmations(&self) -> OrderConfirmationService {
        OrderConfirmationService::new(Arc::clone(&self.engine))
    }

    pub(super) fn bygherre(&self) -> BygherreService {
        BygherreService::new(Arc::clone(&self.engine))
    }

    pub(super) fn photo_reports(&self) -> PhotoReportService {
        PhotoReportService::new(Arc::clone(&self.engine))
    }

    /// Stores `task` and returns its id.
    pub(super) fn seed(&self, task: Task) -> TaskId {
        let id = task.id();
        self.tasks.insert(task).expect("task stored");
        id
    }
}

pub(super) fn staff() -> StaffActor {
    StaffActor::new("staff-1", "Mette Holm")
}

pub(super) fn task_with(contact: ContactSnapshot, owners: Vec<PropertyOwner>) -> Task {
    let now = Utc::now();
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        task_number: Some("T-1042".to_owned()),
        status: TaskStatus::AwaitingConfirmation,
        address: SiteAddress::new("Nørregade 1", "5000", "Odense C"),
        company_name: Some("Boligselskabet Fyn".to_owned()),
        contact,
        owners,
        summary: Some("Udskiftning af termoruder".to_owned()),
        damages: vec![TaskDamage {
            part: "Termorude".to_owned(),
            location: Some("Stue".to_owned()),
            notes: None,
            quantity: 2,
        }],
        mirror: Default::default(),
        created_at: now,
        updated_at: now,
    })
}

/// A task with a reachable contact and two property owners.
pub(super) fn task() -> Task {
    task_with(
        ContactSnapshot {
            contact_id: None,
            name: Some("Karen Jensen".to_owned()),
            email: Some("karen@example.com".to_owned()),
            phone: Some("20304050".to_owned()),
        },
        vec![
            PropertyOwner {
                name: Some("Ole Hansen".to_owned()),
                phone: Some("30405060".to_owned()),
                email: None,
            },
            PropertyOwner {
                name: Some("Lis Hansen".to_owned()),
                phone: Some("40506070".to_owned()),
                email: None,
            },
        ],
    )
}
