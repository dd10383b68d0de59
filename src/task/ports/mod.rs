//! Port contracts for task reads and mirror writes.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow services.

pub mod directory;
pub mod store;

pub use directory::{ContactDirectory, ContactDirectoryError, ContactDirectoryResult};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};
