//! REST endpoint handlers organized by resource.

pub mod display;
pub mod queue;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(queue::routes())
        .merge(display::routes())
}
