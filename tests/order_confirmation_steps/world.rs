//! Shared world state for order confirmation BDD scenarios.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use confirmation_engine::activity::{adapters::memory::InMemoryActivityLog, domain::StaffActor};
use confirmation_engine::notification::{
    adapters::memory::{InMemoryLedger, RecordingEmailProvider, RecordingSmsProvider},
    services::{DispatcherConfig, MessageTemplates, NotificationDispatcher},
};
use confirmation_engine::task::{
    adapters::memory::{InMemoryContactDirectory, InMemoryTaskStore},
    domain::{ContactSnapshot, PersistedTaskData, SiteAddress, Task, TaskId, TaskStatus},
    ports::TaskStore,
};
use confirmation_engine::workflow::{
    adapters::memory::InMemoryWorkflowStore,
    domain::OrderConfirmationRecord,
    services::{
        EngineParts, ExpiryPolicy, OrderConfirmationService, OsRngTokenSource, PublicLinks,
        TokenIssuer, WorkflowEngine, WorkflowServiceError,
    },
};
use mockable::Clock;
use rstest::fixture;

/// Clock the scenarios move forward explicitly.
pub struct ScenarioClock {
    now: RwLock<DateTime<Utc>>,
}

impl ScenarioClock {
    /// Moves the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut now) = self.now.write() {
            *now += by;
        }
    }
}

impl Clock for ScenarioClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
            .read()
            .map_or_else(|poisoned| *poisoned.into_inner(), |now| *now)
    }
}

/// Scenario world for order confirmation behaviour tests.
pub struct OrderConfirmationWorld {
    pub clock: Arc<ScenarioClock>,
    pub tasks: Arc<InMemoryTaskStore>,
    pub service: OrderConfirmationService,
    pub task_id: Option<TaskId>,
    pub token: Option<String>,
    pub record: Option<OrderConfirmationRecord>,
    pub last_error: Option<WorkflowServiceError>,
}

impl OrderConfirmationWorld {
    /// Creates a world around a fresh in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 6, 1, 7, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let clock = Arc::new(ScenarioClock {
            now: RwLock::new(start),
        });
        let tasks = Arc::new(InMemoryTaskStore::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let dispatcher = NotificationDispatcher::new(
            Arc::new(RecordingSmsProvider::new()),
            Arc::new(RecordingEmailProvider::new()),
            ledger,
            clock.clone(),
            DispatcherConfig::default(),
        );
        let templates = MessageTemplates::new("SMARTREP").expect("built-in templates parse");
        let engine = Arc::new(WorkflowEngine::new(EngineParts {
            store: Arc::new(InMemoryWorkflowStore::new()),
            tasks: tasks.clone(),
            contacts: Arc::new(InMemoryContactDirectory::new()),
            activity: Arc::new(InMemoryActivityLog::new()),
            clock: clock.clone(),
            issuer: TokenIssuer::new(
                Arc::new(OsRngTokenSource),
                clock.clone(),
                ExpiryPolicy::default(),
            ),
            dispatcher,
            templates: Arc::new(templates),
            links: PublicLinks::new("https://portal.example.com"),
        }));

        Self {
            clock,
            tasks,
            service: OrderConfirmationService::new(engine),
            task_id: None,
            token: None,
            record: None,
            last_error: None,
        }
    }

    /// Stores a task awaiting confirmation and remembers its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the task store rejects the task.
    pub fn seed_task(&mut self) -> eyre::Result<TaskId> {
        let now = self.clock.utc();
        let id = TaskId::new();
        self.tasks.insert(Task::from_persisted(PersistedTaskData {
            id,
            task_number: Some("T-4410".to_owned()),
            status: TaskStatus::AwaitingConfirmation,
            address: SiteAddress::new("Vestergade 18", "5000", "Odense C"),
            company_name: None,
            contact: ContactSnapshot {
                contact_id: None,
                name: Some("Mette Lund".to_owned()),
                email: Some("mette@example.com".to_owned()),
                phone: Some("40 41 42 43".to_owned()),
            },
            owners: Vec::new(),
            summary: Some("Udskiftning af termorude".to_owned()),
            damages: Vec::new(),
            mirror: Default::default(),
            created_at: now,
            updated_at: now,
        }))?;
        self.task_id = Some(id);
        Ok(id)
    }

    /// Loads the seeded task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is missing or the store fails.
    pub fn task(&self) -> eyre::Result<Task> {
        let id = self.task_id()?;
        run_async(self.tasks.find_by_id(id))?.ok_or_else(|| eyre::eyre!("task {id} missing"))
    }

    /// Returns the seeded task id.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was seeded.
    pub fn task_id(&self) -> eyre::Result<TaskId> {
        self.task_id
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Returns the public token of the sent confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing was sent.
    pub fn token(&self) -> eyre::Result<String> {
        self.token
            .clone()
            .ok_or_else(|| eyre::eyre!("missing token in scenario world"))
    }
}

impl Default for OrderConfirmationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Staff member acting in the scenarios.
#[must_use]
pub fn staff() -> StaffActor {
    StaffActor::new("staff-3", "Lone Friis")
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrderConfirmationWorld {
    OrderConfirmationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
