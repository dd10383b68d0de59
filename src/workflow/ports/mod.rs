//! Port contracts for workflow persistence.

pub mod repository;
pub mod store;

pub use repository::{RecordGuard, WorkflowRepository};
pub use store::{
    StoredWorkflow, UpdateGuard, WorkflowStore, WorkflowStoreError, WorkflowStoreResult,
};
