//! Read-only port onto the company contact directory.

use crate::task::domain::{Contact, ContactId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for contact directory lookups.
pub type ContactDirectoryResult<T> = Result<T, ContactDirectoryError>;

/// Contact lookup contract.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Finds a contact by directory identifier.
    ///
    /// Returns `None` when the contact does not exist.
    async fn find_contact(&self, id: ContactId) -> ContactDirectoryResult<Option<Contact>>;
}

/// Errors returned by contact directory implementations.
#[derive(Debug, Clone, Error)]
pub enum ContactDirectoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ContactDirectoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
