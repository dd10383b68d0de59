//! `PostgreSQL` adapter for the communication ledger.

mod models;
mod repository;
mod schema;

pub use repository::PostgresLedger;
