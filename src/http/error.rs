//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::notification::ports::LedgerError;
use crate::workflow::{domain::WorkflowDomainError, services::WorkflowServiceError};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// Errors rendered as JSON responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown token, record or task.
    #[error("{0} not found")]
    NotFound(String),

    /// The access link has expired.
    #[error("the link has expired")]
    Gone,

    /// Malformed or invalid input, including a second response.
    #[error("{0}")]
    BadRequest(String),

    /// The record is not in a state that allows the operation.
    #[error("{0}")]
    Conflict(String),

    /// A business precondition does not hold.
    #[error("{0}")]
    PreconditionFailed(String),

    /// No staff identity on a staff route.
    #[error("staff identity required")]
    Unauthorized,

    /// The staff role may not use the route.
    #[error("role {0} may not perform this action")]
    Forbidden(String),

    /// Infrastructure failure. The detail is logged, not returned.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status for the error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone => StatusCode::GONE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Gone => "EXPIRED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(error = %detail, "request failed");
        }
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<WorkflowServiceError> for ApiError {
    fn from(err: WorkflowServiceError) -> Self {
        match err {
            WorkflowServiceError::NotFound(what) => Self::NotFound(what),
            WorkflowServiceError::TaskNotFound(id) => Self::NotFound(format!("task {id}")),
            WorkflowServiceError::Expired => Self::Gone,
            WorkflowServiceError::AlreadyResponded => Self::BadRequest(err.to_string()),
            WorkflowServiceError::PreconditionFailed(message) => Self::PreconditionFailed(message),
            WorkflowServiceError::Conflict { .. } | WorkflowServiceError::AlreadyOpen { .. } => {
                Self::Conflict(err.to_string())
            }
            WorkflowServiceError::Domain(domain) => domain.into(),
            WorkflowServiceError::Message(message) => Self::BadRequest(message.to_string()),
            WorkflowServiceError::TokenCollision
            | WorkflowServiceError::Template(_)
            | WorkflowServiceError::Store(_)
            | WorkflowServiceError::Task(_)
            | WorkflowServiceError::Directory(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<WorkflowDomainError> for ApiError {
    fn from(err: WorkflowDomainError) -> Self {
        match err {
            WorkflowDomainError::AlreadyResponded | WorkflowDomainError::Validation(_) => {
                Self::BadRequest(err.to_string())
            }
            WorkflowDomainError::InvalidTransition { .. }
            | WorkflowDomainError::NotEditable { .. } => Self::Conflict(err.to_string()),
            WorkflowDomainError::UnknownKind(_) | WorkflowDomainError::UnknownStatus(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::Internal(err.to_string())
    }
}
