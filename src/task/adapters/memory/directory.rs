//! In-memory contact directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Contact, ContactId},
    ports::{ContactDirectory, ContactDirectoryError, ContactDirectoryResult},
};

/// Thread-safe in-memory contact directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContactDirectory {
    contacts: Arc<RwLock<HashMap<ContactId, Contact>>>,
}

impl InMemoryContactDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a contact.
    ///
    /// # Errors
    ///
    /// Returns [`ContactDirectoryError::Persistence`] when the lock is poisoned.
    pub fn insert(&self, contact: Contact) -> ContactDirectoryResult<()> {
        let mut contacts = self.contacts.write().map_err(|err| {
            ContactDirectoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        contacts.insert(contact.id, contact);
        Ok(())
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContactDirectory {
    async fn find_contact(&self, id: ContactId) -> ContactDirectoryResult<Option<Contact>> {
        let contacts = self.contacts.read().map_err(|err| {
            ContactDirectoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(contacts.get(&id).cloned())
    }
}
