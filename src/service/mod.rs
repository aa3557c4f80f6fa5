//! Service layer: business logic orchestration.
//!
//! [`QueueService`] runs lifecycle operations against the ticket store
//! and emits events through the [`crate::hub::Hub`].

pub mod queue_service;

pub use queue_service::QueueService;
