//! Directory contact as exposed by the company directory.

use serde::{Deserialize, Serialize};

use super::ContactId;

/// Contact person resolved from the company directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Directory identifier.
    pub id: ContactId,
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}
