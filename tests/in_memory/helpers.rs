//! Shared wiring for in-memory workflow integration tests.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use confirmation_engine::activity::{adapters::memory::InMemoryActivityLog, domain::StaffActor};
use confirmation_engine::notification::{
    adapters::memory::{InMemoryLedger, RecordingEmailProvider, RecordingSmsProvider},
    services::{DispatcherConfig, MessageTemplates, NotificationDispatcher},
};
use confirmation_engine::task::{
    adapters::memory::{InMemoryContactDirectory, InMemoryTaskStore},
    domain::{
        ContactSnapshot, PersistedTaskData, PropertyOwner, SiteAddress, Task, TaskId, TaskStatus,
    },
    ports::TaskStore,
};
use confirmation_engine::workflow::{
    adapters::memory::InMemoryWorkflowStore,
    services::{
        BygherreService, EngineParts, ExpiryPolicy, OrderConfirmationService, OsRngTokenSource,
        PhotoReportService, PublicLinks, TokenIssuer, WorkflowEngine,
    },
};
use mockable::Clock;
use rstest::fixture;

/// Base URL public links are rooted at.
pub const BASE_URL: &str = "https://portal.example.com";

/// Clock that only moves when a test advances it.
pub struct SteppedClock {
    now: RwLock<DateTime<Utc>>,
}

impl SteppedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub const fn frozen_at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut now) = self.now.write() {
            *now += by;
        }
    }
}

impl Clock for SteppedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
            .read()
            .map_or_else(|poisoned| *poisoned.into_inner(), |now| *now)
    }
}

/// A portal backend wired to in-memory adapters.
pub struct Portal {
    pub clock: Arc<SteppedClock>,
    pub tasks: Arc<InMemoryTaskStore>,
    pub ledger: Arc<InMemoryLedger>,
    pub activity: Arc<InMemoryActivityLog>,
    pub sms: RecordingSmsProvider,
    pub email: RecordingEmailProvider,
    pub order_confirmations: OrderConfirmationService,
    pub bygherre: BygherreService,
    pub photo_reports: PhotoReportService,
}

impl Portal {
    /// Stores a task with a reachable contact and one property owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the task store rejects the task.
    pub fn seed_task(&self) -> eyre::Result<TaskId> {
        let now = self.clock.utc();
        let id = TaskId::new();
        self.tasks.insert(Task::from_persisted(PersistedTaskData {
            id,
            task_number: Some("T-3107".to_owned()),
            status: TaskStatus::AwaitingConfirmation,
            address: SiteAddress::new("Klostergade 4", "8000", "Aarhus C"),
            company_name: Some("Andelsboligforeningen Kloster".to_owned()),
            contact: ContactSnapshot {
                contact_id: None,
                name: Some("Birgitte Skov".to_owned()),
                email: Some("birgitte@example.com".to_owned()),
                phone: Some("21 22 23 24".to_owned()),
            },
            owners: vec![PropertyOwner {
                name: Some("Henrik Dahl".to_owned()),
                phone: Some("31 32 33 34".to_owned()),
                email: None,
            }],
            summary: Some("Reparation af vinduesparti".to_owned()),
            damages: Vec::new(),
            mirror: Default::default(),
            created_at: now,
            updated_at: now,
        }))?;
        Ok(id)
    }

    /// Loads a task that must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the task is missing or the store fails.
    pub async fn task(&self, id: TaskId) -> eyre::Result<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| eyre::eyre!("task {id} missing"))
    }
}

/// Staff member driving the scenarios.
#[must_use]
pub fn staff() -> StaffActor {
    StaffActor::new("staff-12", "Rasmus Krogh")
}

/// Provides a fresh portal backend for each test.
#[fixture]
pub fn portal() -> Portal {
    let start = Utc
        .with_ymd_and_hms(2026, 5, 4, 8, 30, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let clock = Arc::new(SteppedClock::frozen_at(start));
    let tasks = Arc::new(InMemoryTaskStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let activity = Arc::new(InMemoryActivityLog::new());
    let sms = RecordingSmsProvider::new();
    let email = RecordingEmailProvider::new();
    let dispatcher = NotificationDispatcher::new(
        Arc::new(sms.clone()),
        Arc::new(email.clone()),
        ledger.clone(),
        clock.clone(),
        DispatcherConfig::default(),
    );
    let templates = MessageTemplates::new("SMARTREP").expect("built-in templates parse");
    let engine = Arc::new(WorkflowEngine::new(EngineParts {
        store: Arc::new(InMemoryWorkflowStore::new()),
        tasks: tasks.clone(),
        contacts: Arc::new(InMemoryContactDirectory::new()),
        activity: activity.clone(),
        clock: clock.clone(),
        issuer: TokenIssuer::new(
            Arc::new(OsRngTokenSource),
            clock.clone(),
            ExpiryPolicy::default(),
        ),
        dispatcher,
        templates: Arc::new(templates),
        links: PublicLinks::new(BASE_URL),
    }));
    Portal {
        clock,
        tasks,
        ledger,
        activity,
        sms,
        email,
        order_confirmations: OrderConfirmationService::new(Arc::clone(&engine)),
        bygherre: BygherreService::new(Arc::clone(&engine)),
        photo_reports: PhotoReportService::new(engine),
    }
}
