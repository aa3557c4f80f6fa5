//! Queue handlers: issue, call, move and list tickets.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CallByCodeRequest, CallNextRequest, CallTicketRequest, CreateTicketRequest, RecallRequest,
    ResetResponse, TicketIdRequest,
};
use crate::app_state::AppState;
use crate::domain::{Category, QueueStats, Ticket};
use crate::error::{ErrorResponse, QueueError};

/// `POST /api/queue/create` — Issue a ticket.
///
/// # Errors
///
/// Returns [`QueueError`] on a malformed body or unknown category.
#[utoipa::path(
    post,
    path = "/api/queue/create",
    tag = "Queue",
    summary = "Issue a ticket",
    description = "Takes the next number of today in the category and broadcasts NEW_TICKET.",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket issued", body = Ticket),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
    )
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    payload: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<impl IntoResponse, QueueError> {
    let Json(req) = payload?;
    let ticket = state.queue_service.create_ticket(req.category_id).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// `GET /api/queue/recent` — Most recently issued tickets.
///
/// # Errors
///
/// Returns [`QueueError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/queue/recent",
    tag = "Queue",
    summary = "Recent tickets",
    description = "Returns the five most recent tickets of any day and status, newest first.",
    responses(
        (status = 200, description = "Recent tickets", body = Vec<Ticket>),
    )
)]
pub async fn recent(State(state): State<AppState>) -> Result<Json<Vec<Ticket>>, QueueError> {
    Ok(Json(state.queue_service.recent().await?))
}

/// `GET /api/queue/waiting` — Today's waiting tickets.
///
/// # Errors
///
/// Returns [`QueueError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/queue/waiting",
    tag = "Queue",
    summary = "Waiting tickets",
    description = "Returns today's waiting tickets ordered by category, then by issue order.",
    responses(
        (status = 200, description = "Waiting tickets", body = Vec<Ticket>),
    )
)]
pub async fn waiting(State(state): State<AppState>) -> Result<Json<Vec<Ticket>>, QueueError> {
    Ok(Json(state.queue_service.waiting().await?))
}

/// `GET /api/queue/stats` — Today's counts.
///
/// # Errors
///
/// Returns [`QueueError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/queue/stats",
    tag = "Queue",
    summary = "Queue statistics",
    responses(
        (status = 200, description = "Counts per status for today", body = QueueStats),
    )
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<QueueStats>, QueueError> {
    Ok(Json(state.queue_service.stats().await?))
}

/// `POST /api/queue/call` — Call a ticket to a counter.
///
/// # Errors
///
/// Returns [`QueueError`] on a bad counter, unknown ticket or refused move.
#[utoipa::path(
    post,
    path = "/api/queue/call",
    tag = "Queue",
    summary = "Call a ticket",
    description = "Moves the ticket to `calling` on the counter and broadcasts CALL_TICKET. Calling a ticket that is already being called re-announces it.",
    request_body = CallTicketRequest,
    responses(
        (status = 200, description = "Ticket called", body = Ticket),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Ticket cannot be called from its status", body = ErrorResponse),
    )
)]
pub async fn call_ticket(
    State(state): State<AppState>,
    payload: Result<Json<CallTicketRequest>, JsonRejection>,
) -> Result<Json<Ticket>, QueueError> {
    let Json(req) = payload?;
    let ticket = state
        .queue_service
        .call_ticket(req.ticket_id, req.counter)
        .await?;
    Ok(Json(ticket))
}

/// `POST /api/queue/call-manual` — Call a ticket by its printed code.
///
/// # Errors
///
/// Returns [`QueueError`] if no ticket of today carries the code.
#[utoipa::path(
    post,
    path = "/api/queue/call-manual",
    tag = "Queue",
    summary = "Call a ticket by code",
    request_body = CallByCodeRequest,
    responses(
        (status = 200, description = "Ticket called", body = Ticket),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 404, description = "No ticket of today with that code", body = ErrorResponse),
        (status = 409, description = "Ticket cannot be called from its status", body = ErrorResponse),
    )
)]
pub async fn call_by_code(
    State(state): State<AppState>,
    payload: Result<Json<CallByCodeRequest>, JsonRejection>,
) -> Result<Json<Ticket>, QueueError> {
    let Json(req) = payload?;
    let ticket = state
        .queue_service
        .call_by_code(&req.code, req.counter)
        .await?;
    Ok(Json(ticket))
}

/// `POST /api/queue/call-next` — Call the oldest waiting ticket.
///
/// # Errors
///
/// Returns [`QueueError`] if nobody is waiting in the category.
#[utoipa::path(
    post,
    path = "/api/queue/call-next",
    tag = "Queue",
    summary = "Call the next waiting ticket",
    request_body = CallNextRequest,
    responses(
        (status = 200, description = "Ticket called", body = Ticket),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 404, description = "Nobody waiting", body = ErrorResponse),
    )
)]
pub async fn call_next(
    State(state): State<AppState>,
    payload: Result<Json<CallNextRequest>, JsonRejection>,
) -> Result<Json<Ticket>, QueueError> {
    let Json(req) = payload?;
    let ticket = state
        .queue_service
        .call_next(req.category_id, req.counter)
        .await?;
    Ok(Json(ticket))
}

/// `POST /api/queue/recall` — Repeat a counter's last call.
///
/// # Errors
///
/// Returns [`QueueError`] if the counter has not called anything.
#[utoipa::path(
    post,
    path = "/api/queue/recall",
    tag = "Queue",
    summary = "Recall",
    description = "Broadcasts CALL_TICKET again for the last ticket called on the counter.",
    request_body = RecallRequest,
    responses(
        (status = 200, description = "Ticket re-announced", body = Ticket),
        (status = 404, description = "Nothing to recall", body = ErrorResponse),
    )
)]
pub async fn recall(
    State(state): State<AppState>,
    payload: Result<Json<RecallRequest>, JsonRejection>,
) -> Result<Json<Ticket>, QueueError> {
    let Json(req) = payload?;
    Ok(Json(state.queue_service.recall(req.counter).await?))
}

/// `POST /api/queue/serve` — Start serving a called ticket.
///
/// # Errors
///
/// Returns [`QueueError`] on unknown ticket or refused move.
#[utoipa::path(
    post,
    path = "/api/queue/serve",
    tag = "Queue",
    summary = "Start serving",
    request_body = TicketIdRequest,
    responses(
        (status = 200, description = "Ticket is being served", body = Ticket),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Ticket is not being called", body = ErrorResponse),
    )
)]
pub async fn serve(
    State(state): State<AppState>,
    payload: Result<Json<TicketIdRequest>, JsonRejection>,
) -> Result<Json<Ticket>, QueueError> {
    let Json(req) = payload?;
    Ok(Json(state.queue_service.start_serving(req.ticket_id).await?))
}

/// `POST /api/queue/skip` — Skip a ticket.
///
/// # Errors
///
/// Returns [`QueueError`] on unknown ticket or refused move.
#[utoipa::path(
    post,
    path = "/api/queue/skip",
    tag = "Queue",
    summary = "Skip a ticket",
    request_body = TicketIdRequest,
    responses(
        (status = 200, description = "Ticket skipped", body = Ticket),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Ticket already closed", body = ErrorResponse),
    )
)]
pub async fn skip(
    State(state): State<AppState>,
    payload: Result<Json<TicketIdRequest>, JsonRejection>,
) -> Result<Json<Ticket>, QueueError> {
    let Json(req) = payload?;
    Ok(Json(state.queue_service.skip(req.ticket_id).await?))
}

/// `POST /api/queue/finish` — Finish a ticket.
///
/// # Errors
///
/// Returns [`QueueError`] on unknown ticket or refused move.
#[utoipa::path(
    post,
    path = "/api/queue/finish",
    tag = "Queue",
    summary = "Finish a ticket",
    request_body = TicketIdRequest,
    responses(
        (status = 200, description = "Ticket finished", body = Ticket),
        (status = 404, description = "Ticket not found", body = ErrorResponse),
        (status = 409, description = "Ticket already closed", body = ErrorResponse),
    )
)]
pub async fn finish(
    State(state): State<AppState>,
    payload: Result<Json<TicketIdRequest>, JsonRejection>,
) -> Result<Json<Ticket>, QueueError> {
    let Json(req) = payload?;
    Ok(Json(state.queue_service.finish(req.ticket_id).await?))
}

/// `POST /api/queue/reset` — Delete today's tickets.
///
/// # Errors
///
/// Returns [`QueueError`] on store failure.
#[utoipa::path(
    post,
    path = "/api/queue/reset",
    tag = "Queue",
    summary = "Reset today's queue",
    description = "Deletes every ticket issued today, forgets recalls and broadcasts RESET_QUEUE.",
    responses(
        (status = 200, description = "Queue reset", body = ResetResponse),
    )
)]
pub async fn reset(State(state): State<AppState>) -> Result<Json<ResetResponse>, QueueError> {
    let deleted = state.queue_service.reset().await?;
    Ok(Json(ResetResponse {
        status: "reset".to_string(),
        deleted,
    }))
}

/// `GET /api/queue/code/{code}` — Look up today's ticket by code.
///
/// # Errors
///
/// Returns [`QueueError`] if no ticket of today carries the code.
#[utoipa::path(
    get,
    path = "/api/queue/code/{code}",
    tag = "Queue",
    summary = "Find ticket by code",
    params(
        ("code" = String, Path, description = "Printed ticket code, e.g. A-007"),
    ),
    responses(
        (status = 200, description = "Ticket found", body = Ticket),
        (status = 404, description = "No ticket of today with that code", body = ErrorResponse),
    )
)]
pub async fn find_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Ticket>, QueueError> {
    Ok(Json(state.queue_service.find_by_code(&code).await?))
}

/// `GET /api/categories` — Service categories.
///
/// # Errors
///
/// Returns [`QueueError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Queue",
    summary = "List categories",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>),
    )
)]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, QueueError> {
    Ok(Json(state.queue_service.categories().await?))
}

/// Queue routes, relative to `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/queue/create", post(create_ticket))
        .route("/queue/recent", get(recent))
        .route("/queue/waiting", get(waiting))
        .route("/queue/stats", get(stats))
        .route("/queue/call", post(call_ticket))
        .route("/queue/call-manual", post(call_by_code))
        .route("/queue/call-next", post(call_next))
        .route("/queue/recall", post(recall))
        .route("/queue/serve", post(serve))
        .route("/queue/skip", post(skip))
        .route("/queue/finish", post(finish))
        .route("/queue/reset", post(reset))
        .route("/queue/code/{code}", get(find_by_code))
        .route("/categories", get(categories))
}
