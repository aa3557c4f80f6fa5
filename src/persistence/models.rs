//! Database row models for tickets, categories, and display settings.

use chrono::{DateTime, Utc};

use crate::domain::{Category, DisplaySettings, Ticket, TicketStatus};
use crate::error::QueueError;

/// Columns selected for every ticket query, in [`TicketRow`] order.
pub const TICKET_COLUMNS: &str = "id, category_id, ticket_number, formatted_code, status, \
                                  counter_number, created_at, updated_at";

/// A row from the `queues` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketRow {
    /// `BIGSERIAL` primary key.
    pub id: i64,
    /// Owning category.
    pub category_id: i32,
    /// Per-category, per-day sequence number.
    pub ticket_number: i32,
    /// Display code.
    pub formatted_code: String,
    /// Status as stored text.
    pub status: String,
    /// Assigned counter, 0 while waiting.
    pub counter_number: i32,
    /// Insert time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = QueueError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<TicketStatus>()
            .map_err(QueueError::Internal)?;
        Ok(Self {
            id: row.id,
            category_id: row.category_id,
            ticket_number: row.ticket_number,
            formatted_code: row.formatted_code,
            status,
            counter: row.counter_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    /// Primary key.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Single-letter prefix.
    pub prefix: String,
    /// Hex color.
    pub color_code: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            prefix: row.prefix,
            color_code: row.color_code,
        }
    }
}

/// The `display_settings` singleton row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DisplaySettingsRow {
    /// Video URL.
    pub video_url: String,
    /// Headline.
    pub title: String,
    /// Sub-headline.
    pub subtitle: String,
}

impl From<DisplaySettingsRow> for DisplaySettings {
    fn from(row: DisplaySettingsRow) -> Self {
        Self {
            video_url: row.video_url,
            title: row.title,
            subtitle: row.subtitle,
        }
    }
}
