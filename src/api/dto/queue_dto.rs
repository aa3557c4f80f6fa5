//! DTOs for queue endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/queue/create`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateTicketRequest {
    /// Category to issue the ticket in.
    pub category_id: i32,
}

/// Request body for `POST /api/queue/call`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CallTicketRequest {
    /// Ticket to call.
    pub ticket_id: i64,
    /// Counter the customer should go to (1 or more).
    pub counter: i32,
}

/// Request body for `POST /api/queue/call-manual`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CallByCodeRequest {
    /// Printed ticket code, e.g. `"A-007"`.
    pub code: String,
    /// Counter the customer should go to (1 or more).
    pub counter: i32,
}

/// Request body for `POST /api/queue/call-next`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CallNextRequest {
    /// Category to take the oldest waiting ticket from.
    pub category_id: i32,
    /// Counter the customer should go to (1 or more).
    pub counter: i32,
}

/// Request body for `POST /api/queue/recall`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecallRequest {
    /// Counter whose last call is repeated.
    pub counter: i32,
}

/// Request body for `serve`, `skip` and `finish`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TicketIdRequest {
    /// Ticket to move.
    pub ticket_id: i64,
}

/// Response body for `POST /api/queue/reset`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ResetResponse {
    /// Always `"reset"`.
    pub status: String,
    /// Number of tickets deleted.
    pub deleted: u64,
}
