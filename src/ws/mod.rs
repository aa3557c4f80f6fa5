//! WebSocket layer: the `/ws` push channel for displays.
//!
//! Clients only listen. Every broadcast event is sent as one JSON text
//! frame; the server pings periodically and drops idle clients.

pub mod connection;
pub mod handler;

pub use connection::HeartbeatConfig;
