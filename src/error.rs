//! Queue error types with HTTP status code mapping.
//!
//! [`QueueError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::TicketStatus;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "ticket not found: 42"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the ranges on [`QueueError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status               |
/// |-----------|-------------------|---------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request           |
/// | 2000–2099 | Not Found         | 404 Not Found             |
/// | 2100–2199 | Conflict          | 409 Conflict              |
/// | 3000–3999 | Server / Store    | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Request validation failed before reaching the engine.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Ticket with the given id does not exist.
    #[error("ticket not found: {0}")]
    TicketNotFound(i64),

    /// No ticket created today carries the given code.
    #[error("ticket not found for code {0}")]
    TicketCodeNotFound(String),

    /// Category with the given id does not exist.
    #[error("category not found: {0}")]
    CategoryNotFound(i32),

    /// Counter has not called any ticket yet.
    #[error("no ticket to recall on counter {0}")]
    NothingToRecall(i32),

    /// Category has no waiting ticket today.
    #[error("no waiting ticket in category {0}")]
    NoWaitingTicket(i32),

    /// Requested status change is not allowed from the ticket's current status.
    #[error("ticket {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Ticket id.
        id: i64,
        /// Status the ticket currently holds.
        from: TicketStatus,
        /// Status that was requested.
        to: TicketStatus,
    },

    /// Two tickets competed for the same number in one category and day.
    #[error("sequence conflict: {0}")]
    SequenceConflict(String),

    /// Datastore connection or query failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QueueError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::TicketNotFound(_) => 2001,
            Self::TicketCodeNotFound(_) => 2002,
            Self::CategoryNotFound(_) => 2003,
            Self::NothingToRecall(_) => 2004,
            Self::NoWaitingTicket(_) => 2005,
            Self::InvalidTransition { .. } => 2101,
            Self::SequenceConflict(_) => 2102,
            Self::Internal(_) => 3000,
            Self::StoreUnavailable(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::TicketNotFound(_)
            | Self::TicketCodeNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::NothingToRecall(_)
            | Self::NoWaitingTicket(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } | Self::SequenceConflict(_) => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for every "not found" variant.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status_code(), StatusCode::NOT_FOUND)
    }
}

impl From<sqlx::Error> for QueueError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::SequenceConflict(db.message().to_string())
            }
            _ => Self::StoreUnavailable(err.to_string()),
        }
    }
}

impl From<JsonRejection> for QueueError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        let errors = [
            QueueError::TicketNotFound(1),
            QueueError::TicketCodeNotFound("A-001".to_string()),
            QueueError::CategoryNotFound(9),
            QueueError::NothingToRecall(3),
            QueueError::NoWaitingTicket(1),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn transition_error_is_conflict() {
        let err = QueueError::InvalidTransition {
            id: 5,
            from: TicketStatus::Finished,
            to: TicketStatus::Calling,
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2101);
        assert_eq!(err.to_string(), "ticket 5 cannot move from finished to calling");
    }

    #[test]
    fn row_not_found_is_store_failure() {
        let err = QueueError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, QueueError::StoreUnavailable(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_carries_status_and_code() {
        let response = QueueError::InvalidRequest("counter must be positive".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
