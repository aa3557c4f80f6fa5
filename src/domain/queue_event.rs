//! Broadcast events reflecting queue state changes.
//!
//! Every successful mutation that the display cares about emits a
//! [`QueueEvent`] through the [`crate::hub::Hub`]. Events are ephemeral:
//! they exist only for the duration of the fan-out.

use serde::{Deserialize, Serialize};

use super::{DisplaySettings, Ticket};

/// Event pushed to every real-time subscriber.
///
/// Serialized as `{"type": "CALL_TICKET", "data": {...}}`; `RESET_QUEUE`
/// carries no `data` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueEvent {
    /// A ticket was issued.
    NewTicket(Ticket),
    /// A ticket was called (or recalled) to a counter.
    CallTicket(Ticket),
    /// Today's queue was wiped.
    ResetQueue,
    /// Display settings were replaced.
    UpdateVideo(DisplaySettings),
}

impl QueueEvent {
    /// Returns the wire tag as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::NewTicket(_) => "NEW_TICKET",
            Self::CallTicket(_) => "CALL_TICKET",
            Self::ResetQueue => "RESET_QUEUE",
            Self::UpdateVideo(_) => "UPDATE_VIDEO",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::TicketStatus;
    use chrono::Utc;

    fn make_ticket() -> Ticket {
        Ticket {
            id: 11,
            category_id: 1,
            ticket_number: 7,
            formatted_code: "A-007".to_string(),
            status: TicketStatus::Calling,
            counter: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn call_ticket_serializes_with_type_and_data() {
        let event = QueueEvent::CallTicket(make_ticket());
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(value["type"], "CALL_TICKET");
        assert_eq!(value["data"]["formatted_code"], "A-007");
        assert_eq!(value["data"]["status"], "calling");
        assert_eq!(value["data"]["counter"], 3);
    }

    #[test]
    fn reset_has_no_data() {
        let Ok(value) = serde_json::to_value(QueueEvent::ResetQueue) else {
            panic!("serialization failed");
        };
        assert_eq!(value, serde_json::json!({ "type": "RESET_QUEUE" }));
    }

    #[test]
    fn update_video_carries_settings() {
        let event = QueueEvent::UpdateVideo(DisplaySettings {
            video_url: "https://cdn.example/clip.mp4".to_string(),
            title: "Welcome".to_string(),
            subtitle: "Please wait".to_string(),
        });
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("UPDATE_VIDEO"));
        assert!(json.contains("clip.mp4"));
        assert_eq!(event.event_type_str(), "UPDATE_VIDEO");
    }
}
