//! Data Transfer Objects for REST request/response serialization.
//!
//! Tickets, categories, stats and display settings are returned as their
//! domain types; only request bodies and composite replies live here.

pub mod queue_dto;

pub use queue_dto::*;
