//! Domain layer: tickets, categories, display settings, and events.
//!
//! This module contains the queue's data model, the ticket status state
//! machine, the broadcast event type, and the call board that remembers
//! the last ticket called on each counter.

pub mod call_board;
pub mod display;
pub mod queue_event;
pub mod ticket;

pub use call_board::CallBoard;
pub use display::DisplaySettings;
pub use queue_event::QueueEvent;
pub use ticket::{Category, QueueStats, Ticket, TicketStatus, format_code};
