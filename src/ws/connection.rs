//! WebSocket connection loop.
//!
//! Forwards hub events to one display client and keeps the connection
//! honest with pings. Inbound frames are not interpreted: any frame counts
//! as a sign of life, and a Close frame or a read error ends the loop.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::QueueConfig;
use crate::hub::Subscription;

/// Ping cadence and idle cutoff for WebSocket connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Time between server pings.
    pub interval: Duration,
    /// Inbound silence after which the connection is closed. Also bounds
    /// every outbound write.
    pub idle_timeout: Duration,
}

impl HeartbeatConfig {
    /// Reads the heartbeat settings from the service configuration.
    #[must_use]
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.ws_heartbeat_interval_secs.max(1)),
            idle_timeout: Duration::from_secs(config.ws_idle_timeout_secs.max(1)),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(75),
        }
    }
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Serializes every event from `subscription` as a JSON text frame.
/// - Pings the client every `heartbeat.interval`.
/// - Closes when the client goes quiet for `heartbeat.idle_timeout`, when
///   the hub drops the subscription, or when a write stalls.
///
/// The subscription is dropped on return, which unregisters it.
pub async fn run_connection(
    socket: WebSocket,
    mut subscription: Subscription,
    heartbeat: HeartbeatConfig,
) {
    let subscriber = subscription.id();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat.interval, heartbeat.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen = Instant::now();

    tracing::info!(%subscriber, "ws client connected");

    loop {
        tokio::select! {
            // Event from the hub
            event = subscription.recv() => {
                let Some(event) = event else {
                    tracing::info!(%subscriber, "dropped by hub; closing ws connection");
                    break;
                };
                let json = match serde_json::to_string(&*event) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::error!(%subscriber, error = %err, "event serialization failed");
                        continue;
                    }
                };
                if !send_frame(&mut ws_tx, Message::text(json), heartbeat.idle_timeout).await {
                    tracing::debug!(%subscriber, "ws write failed");
                    break;
                }
            }
            // Incoming frame from client
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => last_seen = Instant::now(),
                    Some(Err(err)) => {
                        tracing::debug!(%subscriber, error = %err, "ws read failed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if last_seen.elapsed() >= heartbeat.idle_timeout {
                    tracing::info!(%subscriber, "ws client idle; closing");
                    break;
                }
                if !send_frame(&mut ws_tx, Message::Ping(Bytes::new()), heartbeat.idle_timeout).await {
                    tracing::debug!(%subscriber, "ws ping failed");
                    break;
                }
            }
        }
    }

    let _ = send_frame(&mut ws_tx, Message::Close(None), heartbeat.idle_timeout).await;
    drop(subscription);
    tracing::info!(%subscriber, "ws connection closed");
}

/// Sends one frame, giving up after `deadline`.
async fn send_frame(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    frame: Message,
    deadline: Duration,
) -> bool {
    matches!(
        tokio::time::timeout(deadline, ws_tx.send(frame)).await,
        Ok(Ok(()))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_intervals_are_clamped() {
        let config = QueueConfig {
            listen_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            store_backend: crate::config::StoreBackend::Memory,
            database_url: String::new(),
            database_max_connections: 1,
            database_min_connections: 0,
            database_connect_timeout_secs: 1,
            database_connect_retries: 1,
            database_retry_delay_secs: 0,
            database_run_migrations: false,
            hub_subscriber_buffer: 1,
            ws_heartbeat_interval_secs: 0,
            ws_idle_timeout_secs: 0,
            request_timeout_secs: 1,
            log_json: false,
        };
        let heartbeat = HeartbeatConfig::from_config(&config);
        assert_eq!(heartbeat.interval, Duration::from_secs(1));
        assert_eq!(heartbeat.idle_timeout, Duration::from_secs(1));
    }

    #[test]
    fn default_idle_exceeds_interval() {
        let heartbeat = HeartbeatConfig::default();
        assert!(heartbeat.idle_timeout > heartbeat.interval);
    }
}
