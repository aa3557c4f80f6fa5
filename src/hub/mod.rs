//! Real-time broadcast hub.
//!
//! Keeps the set of connected display/admin subscribers and fans queue
//! events out to them. See [`Hub`] for the concurrency model.

pub mod broadcaster;

pub use broadcaster::{Hub, HubError, SharedEvent, Subscription};
