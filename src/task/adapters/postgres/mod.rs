//! `PostgreSQL` adapters for task reads and mirror writes.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresContactDirectory, PostgresTaskStore, TaskPgPool};
