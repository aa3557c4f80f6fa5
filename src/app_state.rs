//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::CallBoard;
use crate::hub::Hub;
use crate::persistence::Store;
use crate::service::QueueService;
use crate::ws::HeartbeatConfig;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Queue service for all business logic.
    pub queue_service: Arc<QueueService<Store>>,
    /// Broadcast hub for WebSocket subscriptions.
    pub hub: Hub,
    /// Ping cadence for WebSocket connections.
    pub heartbeat: HeartbeatConfig,
}

impl AppState {
    /// Wires the service over `store`, publishing through `hub`.
    ///
    /// Spawns the call board task, so this must run inside a tokio runtime.
    #[must_use]
    pub fn new(store: Store, hub: Hub, heartbeat: HeartbeatConfig) -> Self {
        let queue_service = Arc::new(QueueService::new(
            Arc::new(store),
            hub.clone(),
            CallBoard::spawn(),
        ));
        Self {
            queue_service,
            hub,
            heartbeat,
        }
    }
}
