//! Display settings handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::DisplaySettings;
use crate::error::{ErrorResponse, QueueError};

/// `GET /api/display/video` — Current display settings.
///
/// # Errors
///
/// Returns [`QueueError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/display/video",
    tag = "Display",
    summary = "Get display settings",
    responses(
        (status = 200, description = "Current settings", body = DisplaySettings),
    )
)]
pub async fn get_video(State(state): State<AppState>) -> Result<Json<DisplaySettings>, QueueError> {
    Ok(Json(state.queue_service.display_settings().await?))
}

/// `POST /api/display/video` — Replace display settings.
///
/// # Errors
///
/// Returns [`QueueError`] on a malformed body or store failure.
#[utoipa::path(
    post,
    path = "/api/display/video",
    tag = "Display",
    summary = "Update display settings",
    description = "Overwrites the settings and broadcasts UPDATE_VIDEO to every display.",
    request_body = DisplaySettings,
    responses(
        (status = 200, description = "Settings saved", body = DisplaySettings),
        (status = 400, description = "Malformed request", body = ErrorResponse),
    )
)]
pub async fn update_video(
    State(state): State<AppState>,
    payload: Result<Json<DisplaySettings>, JsonRejection>,
) -> Result<Json<DisplaySettings>, QueueError> {
    let Json(settings) = payload?;
    Ok(Json(
        state.queue_service.update_display_settings(settings).await?,
    ))
}

/// Display routes, relative to `/api`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/display/video", get(get_video).post(update_video))
}
