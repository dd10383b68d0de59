//! Staff identity supplied by the upstream authentication layer.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use super::ApiError;
use crate::activity::domain::StaffActor;

/// Header carrying the staff user id.
pub const STAFF_ID_HEADER: &str = "x-staff-id";
/// Header carrying the staff display name.
pub const STAFF_NAME_HEADER: &str = "x-staff-name";
/// Header carrying the staff role.
pub const STAFF_ROLE_HEADER: &str = "x-staff-role";

/// Portal staff roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRole {
    /// Full access.
    Admin,
    /// Technician with office rights.
    TechnicianAdmin,
    /// Field technician.
    Technician,
}

impl StaffRole {
    /// Roles allowed to send and activate order confirmations.
    pub const ORDER_DESK: &'static [Self] = &[Self::Admin, Self::TechnicianAdmin];
    /// Roles allowed to message property owners.
    pub const ADMIN_ONLY: &'static [Self] = &[Self::Admin];
    /// Every staff role.
    pub const ANY: &'static [Self] = &[Self::Admin, Self::TechnicianAdmin, Self::Technician];

    /// Returns the header representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::TechnicianAdmin => "technician_admin",
            Self::Technician => "technician",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "admin" => Some(Self::Admin),
            "technician_admin" => Some(Self::TechnicianAdmin),
            "technician" => Some(Self::Technician),
            _ => None,
        }
    }
}

/// Authenticated staff member making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffIdentity {
    /// Actor recorded on audit entries.
    pub actor: StaffActor,
    /// Role the request is checked against.
    pub role: StaffRole,
}

impl StaffIdentity {
    /// Checks the role against the roles a route admits.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] when the role is not admitted.
    pub fn require(&self, allowed: &[StaffRole]) -> Result<&StaffActor, ApiError> {
        if allowed.contains(&self.role) {
            Ok(&self.actor)
        } else {
            Err(ApiError::Forbidden(self.role.as_str().to_owned()))
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for StaffIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, STAFF_ID_HEADER).ok_or(ApiError::Unauthorized)?;
        let role_header = header(parts, STAFF_ROLE_HEADER).ok_or(ApiError::Unauthorized)?;
        let role = StaffRole::parse(role_header)
            .ok_or_else(|| ApiError::Forbidden(role_header.to_owned()))?;
        let name = header(parts, STAFF_NAME_HEADER).unwrap_or(id);
        Ok(Self {
            actor: StaffActor::new(id, name),
            role,
        })
    }
}
