//! `PostgreSQL` adapter for workflow records.

mod models;
mod repository;
mod schema;

pub use repository::PostgresWorkflowStore;
