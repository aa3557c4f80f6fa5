//! Ticket entity, status state machine, and code formatting.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a ticket.
///
/// ```text
/// waiting ──► calling ──► serving ──► finished
///    │          │  ▲                     ▲
///    │          └──┘ (re-call)           │
///    ├──────────┴──► skipped             │
///    └───────────────────────────────────┘
/// ```
///
/// `finished` and `skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Issued and waiting to be called.
    Waiting,
    /// Announced to a counter.
    Calling,
    /// Being served at the counter.
    Serving,
    /// Passed over; terminal.
    Skipped,
    /// Service completed; terminal.
    Finished,
}

impl TicketStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Waiting,
        Self::Calling,
        Self::Serving,
        Self::Skipped,
        Self::Finished,
    ];

    /// Returns the lowercase storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Calling => "calling",
            Self::Serving => "serving",
            Self::Skipped => "skipped",
            Self::Finished => "finished",
        }
    }

    /// Statuses a ticket may hold for a move into `self` to be accepted.
    #[must_use]
    pub const fn allowed_sources(self) -> &'static [Self] {
        match self {
            Self::Waiting => &[],
            Self::Calling => &[Self::Waiting, Self::Calling],
            Self::Serving => &[Self::Calling],
            Self::Skipped => &[Self::Waiting, Self::Calling],
            Self::Finished => &[Self::Waiting, Self::Calling, Self::Serving],
        }
    }

    /// Returns `true` if a ticket in `self` may move to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next.allowed_sources().contains(&self)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown ticket status: {s}"))
    }
}

/// Composes the human-readable ticket code, e.g. `A-007`.
///
/// The number is zero-padded to at least three digits; numbers past 999
/// widen the field (`A-1000`) rather than wrap.
#[must_use]
pub fn format_code(prefix: &str, ticket_number: i32) -> String {
    format!("{prefix}-{ticket_number:03}")
}

/// One customer's place in a category's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    /// Datastore-assigned identifier, monotonic.
    pub id: i64,
    /// Category the ticket was issued in.
    pub category_id: i32,
    /// Per-category, per-day sequence number starting at 1.
    pub ticket_number: i32,
    /// Display code derived from prefix and number.
    pub formatted_code: String,
    /// Current lifecycle status.
    pub status: TicketStatus,
    /// Counter the ticket was called to; 0 while waiting.
    pub counter: i32,
    /// Issue time.
    pub created_at: DateTime<Utc>,
    /// Time of the last status change.
    pub updated_at: DateTime<Utc>,
}

/// A service line with its own code prefix and daily sequence space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    /// Category identifier.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Single-letter code prefix.
    pub prefix: String,
    /// Hex color used by the front-ends.
    pub color_code: String,
}

impl Category {
    /// Builds a category from borrowed parts.
    #[must_use]
    pub fn new(id: i32, name: &str, prefix: &str, color_code: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            prefix: prefix.to_string(),
            color_code: color_code.to_string(),
        }
    }

    /// Categories seeded on a fresh install.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(1, "Lab Examination", "A", "#2563eb"),
            Self::new(2, "PCR / Swab Test", "B", "#059669"),
            Self::new(3, "Result Collection", "C", "#f97316"),
        ]
    }
}

/// Today's ticket counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QueueStats {
    /// Tickets waiting to be called.
    pub waiting: i64,
    /// Tickets currently announced.
    pub calling: i64,
    /// Tickets at a counter.
    pub serving: i64,
    /// Completed tickets.
    pub finished: i64,
    /// Skipped tickets.
    pub skipped: i64,
    /// All tickets issued today.
    pub total: i64,
}

impl QueueStats {
    /// Tallies the given statuses.
    #[must_use]
    pub fn tally(statuses: impl IntoIterator<Item = TicketStatus>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            let slot = match status {
                TicketStatus::Waiting => &mut stats.waiting,
                TicketStatus::Calling => &mut stats.calling,
                TicketStatus::Serving => &mut stats.serving,
                TicketStatus::Finished => &mut stats.finished,
                TicketStatus::Skipped => &mut stats.skipped,
            };
            *slot += 1;
            stats.total += 1;
        }
        stats
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn code_is_zero_padded() {
        assert_eq!(format_code("A", 7), "A-007");
        assert_eq!(format_code("B", 42), "B-042");
        assert_eq!(format_code("C", 999), "C-999");
    }

    #[test]
    fn code_widens_past_three_digits() {
        assert_eq!(format_code("A", 1000), "A-1000");
    }

    #[test]
    fn terminal_statuses_have_no_exit() {
        for next in TicketStatus::ALL {
            assert!(!TicketStatus::Finished.can_transition_to(next));
            assert!(!TicketStatus::Skipped.can_transition_to(next));
        }
    }

    #[test]
    fn nothing_returns_to_waiting() {
        for from in TicketStatus::ALL {
            assert!(!from.can_transition_to(TicketStatus::Waiting));
        }
    }

    #[test]
    fn calling_is_reenterable() {
        assert!(TicketStatus::Calling.can_transition_to(TicketStatus::Calling));
        assert!(TicketStatus::Waiting.can_transition_to(TicketStatus::Calling));
        assert!(!TicketStatus::Serving.can_transition_to(TicketStatus::Calling));
    }

    #[test]
    fn serving_can_only_finish() {
        assert!(TicketStatus::Serving.can_transition_to(TicketStatus::Finished));
        assert!(!TicketStatus::Serving.can_transition_to(TicketStatus::Skipped));
    }

    #[test]
    fn status_parses_its_own_text() {
        for status in TicketStatus::ALL {
            assert_eq!(status.as_str().parse::<TicketStatus>(), Ok(status));
        }
        assert!("paused".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TicketStatus::Calling).unwrap_or_default();
        assert_eq!(json, "\"calling\"");
    }

    #[test]
    fn tally_counts_each_status() {
        let stats = QueueStats::tally([
            TicketStatus::Waiting,
            TicketStatus::Waiting,
            TicketStatus::Calling,
            TicketStatus::Finished,
            TicketStatus::Skipped,
        ]);
        assert_eq!(stats.waiting, 2);
        assert_eq!(stats.calling, 1);
        assert_eq!(stats.serving, 0);
        assert_eq!(stats.finished, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.total, 5);
    }
}
