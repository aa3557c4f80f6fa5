//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Queue and display endpoints are mounted under `/api`; the health check
//! and the `/ws` upgrade sit at the root.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "queue-gateway",
        description = "Ticket numbering engine and real-time display hub for walk-in service queues."
    ),
    paths(
        handlers::queue::create_ticket,
        handlers::queue::recent,
        handlers::queue::waiting,
        handlers::queue::stats,
        handlers::queue::call_ticket,
        handlers::queue::call_by_code,
        handlers::queue::call_next,
        handlers::queue::recall,
        handlers::queue::serve,
        handlers::queue::skip,
        handlers::queue::finish,
        handlers::queue::reset,
        handlers::queue::find_by_code,
        handlers::queue::categories,
        handlers::display::get_video,
        handlers::display::update_video,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Queue", description = "Ticket lifecycle"),
        (name = "Display", description = "Waiting-room display settings"),
        (name = "System", description = "Operational endpoints"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

/// Builds the full application: REST routes, the `/ws` upgrade, and the
/// tracing, CORS and timeout layers, bound to `state`.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_queue_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/queue/create",
            "/api/queue/call-manual",
            "/api/queue/code/{code}",
            "/api/display/video",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
