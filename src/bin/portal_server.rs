//! Serves the confirmation workflows over HTTP.
//!
//! Usage:
//!
//! ```text
//! PORTAL_CONFIG=portal.toml portal-server
//! ```
//!
//! Every setting can also come from the environment; see
//! [`confirmation_engine::config::AppConfig`]. Without `DATABASE_URL` the
//! server keeps all state in memory, which suits demos and local
//! development. Channels whose provider credentials are missing are
//! reported as not configured on every dispatch.

use std::sync::Arc;

use confirmation_engine::activity::{
    adapters::{memory::InMemoryActivityLog, postgres::PostgresActivityLog},
    ports::ActivityLog,
};
use confirmation_engine::config::{AppConfig, ConfigError};
use confirmation_engine::http::{AppState, router};
use confirmation_engine::notification::{
    adapters::{
        http::{SendGridEmailProvider, TwilioSmsProvider, UnconfiguredProvider},
        memory::InMemoryLedger,
        postgres::PostgresLedger,
    },
    ports::{CommunicationLedger, EmailProvider, ProviderError, SmsProvider},
    services::{MessageTemplates, NotificationDispatcher, TemplateError},
};
use confirmation_engine::task::{
    adapters::{
        memory::{InMemoryContactDirectory, InMemoryTaskStore},
        postgres::{PostgresContactDirectory, PostgresTaskStore, TaskPgPool},
    },
    ports::{ContactDirectory, TaskStore},
};
use confirmation_engine::workflow::{
    adapters::{memory::InMemoryWorkflowStore, postgres::PostgresWorkflowStore},
    ports::WorkflowStore,
    services::{EngineParts, OsRngTokenSource, PublicLinks, TokenIssuer, WorkflowEngine},
};
use diesel::{
    PgConnection,
    r2d2::{ConnectionManager, Pool, PoolError},
};
use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open database pool: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to build provider client: {0}")]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to serve on {addr}: {source}")]
    Serve {
        addr: String,
        source: std::io::Error,
    },
}

/// Store adapters chosen by configuration.
struct Stores {
    workflows: Arc<dyn WorkflowStore>,
    tasks: Arc<dyn TaskStore>,
    contacts: Arc<dyn ContactDirectory>,
    activity: Arc<dyn ActivityLog>,
    ledger: Arc<dyn CommunicationLedger>,
}

impl Stores {
    fn postgres(database_url: &str) -> Result<Self, StartupError> {
        let pool: TaskPgPool =
            Pool::builder().build(ConnectionManager::<PgConnection>::new(database_url))?;
        Ok(Self {
            workflows: Arc::new(PostgresWorkflowStore::new(pool.clone())),
            tasks: Arc::new(PostgresTaskStore::new(pool.clone())),
            contacts: Arc::new(PostgresContactDirectory::new(pool.clone())),
            activity: Arc::new(PostgresActivityLog::new(pool.clone())),
            ledger: Arc::new(PostgresLedger::new(pool)),
        })
    }

    fn in_memory() -> Self {
        Self {
            workflows: Arc::new(InMemoryWorkflowStore::new()),
            tasks: Arc::new(InMemoryTaskStore::new()),
            contacts: Arc::new(InMemoryContactDirectory::new()),
            activity: Arc::new(InMemoryActivityLog::new()),
            ledger: Arc::new(InMemoryLedger::new()),
        }
    }
}

fn sms_provider(config: &AppConfig) -> Result<Arc<dyn SmsProvider>, StartupError> {
    match config.twilio_config() {
        Some(twilio) => Ok(Arc::new(TwilioSmsProvider::new(
            twilio,
            config.provider_timeout(),
        )?)),
        None => {
            warn!("Twilio credentials missing; SMS delivery is disabled");
            Ok(Arc::new(UnconfiguredProvider))
        }
    }
}

fn email_provider(config: &AppConfig) -> Result<Arc<dyn EmailProvider>, StartupError> {
    match config.sendgrid_config() {
        Some(sendgrid) => Ok(Arc::new(SendGridEmailProvider::new(
            sendgrid,
            config.provider_timeout(),
        )?)),
        None => {
            warn!("SendGrid credentials missing; email delivery is disabled");
            Ok(Arc::new(UnconfiguredProvider))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    let stores = match config.database_url.as_deref() {
        Some(url) => {
            info!("using PostgreSQL storage");
            Stores::postgres(url)?
        }
        None => {
            warn!("DATABASE_URL not set; state is kept in memory");
            Stores::in_memory()
        }
    };

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(DefaultClock);
    let dispatcher = NotificationDispatcher::new(
        sms_provider(&config)?,
        email_provider(&config)?,
        Arc::clone(&stores.ledger),
        Arc::clone(&clock),
        config.dispatcher_config(),
    );
    let engine = Arc::new(WorkflowEngine::new(EngineParts {
        store: stores.workflows,
        tasks: stores.tasks,
        contacts: stores.contacts,
        activity: stores.activity,
        clock: Arc::clone(&clock),
        issuer: TokenIssuer::new(Arc::new(OsRngTokenSource), clock, config.expiry_policy()),
        dispatcher,
        templates: Arc::new(MessageTemplates::new(&config.brand_name)?),
        links: PublicLinks::new(&config.public_base_url),
    }));
    let app = router(AppState::new(&engine, stores.ledger));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|source| StartupError::Serve {
            addr: config.bind_addr.clone(),
            source,
        })?;
    info!(
        addr = %config.bind_addr,
        public_url = %config.public_base_url,
        "portal server listening"
    );
    axum::serve(listener, app)
        .await
        .map_err(|source| StartupError::Serve {
            addr: config.bind_addr.clone(),
            source,
        })
}
