//! In-memory task and directory adapters for tests and local runs.

mod directory;
mod task;

pub use directory::InMemoryContactDirectory;
pub use task::InMemoryTaskStore;
