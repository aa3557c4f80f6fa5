//! # queue-gateway
//!
//! Ticket numbering engine and real-time display hub for walk-in service
//! queues.
//!
//! Customers take numbered tickets per service category (`A-001`,
//! `B-014`, ...). Staff call, serve, skip and finish them over REST, and
//! every call is pushed to waiting-room displays over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket displays)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── QueueService (service/)
//!     ├── Hub (hub/)  ·  CallBoard (domain/)
//!     │
//!     └── TicketStore (persistence/)
//!           ├── PostgreSQL
//!           └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod persistence;
pub mod service;
pub mod ws;
