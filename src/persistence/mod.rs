//! Persistence layer: the ticket datastore contract and its backends.
//!
//! [`TicketStore`] is the narrow query interface the lifecycle engine runs
//! against. [`PostgresStore`] is the production backend; [`MemoryStore`]
//! keeps the same semantics in process for tests and database-less runs.
//! [`Store`] picks one at startup.

pub mod memory;
pub mod models;
pub mod postgres;

use std::future::Future;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{Category, DisplaySettings, QueueStats, Ticket, TicketStatus};
use crate::error::QueueError;

/// How many tickets the "recent" list shows.
pub const RECENT_LIMIT: i64 = 5;

/// Transactional ticket datastore.
///
/// "Today" is the UTC calendar date; ticket numbers, code lookups, waiting
/// lists, stats and resets are all scoped to it.
pub trait TicketStore: Send + Sync {
    /// Issues the next ticket of today in `category_id` with status
    /// `waiting`.
    ///
    /// Reading the current maximum and inserting happen atomically with
    /// respect to other creations in the same category.
    ///
    /// # Errors
    ///
    /// [`QueueError::CategoryNotFound`] for an unknown category,
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn create_ticket(
        &self,
        category_id: i32,
    ) -> impl Future<Output = Result<Ticket, QueueError>> + Send;

    /// Loads a ticket by id.
    ///
    /// # Errors
    ///
    /// [`QueueError::TicketNotFound`] if absent.
    fn get_ticket(&self, id: i64) -> impl Future<Output = Result<Ticket, QueueError>> + Send;

    /// Finds today's ticket carrying `code`.
    ///
    /// # Errors
    ///
    /// [`QueueError::TicketCodeNotFound`] if no ticket of today matches.
    fn find_by_code(&self, code: &str) -> impl Future<Output = Result<Ticket, QueueError>> + Send;

    /// Moves a ticket to `to` if its current status is one of
    /// [`TicketStatus::allowed_sources`], setting the counter when given and
    /// refreshing `updated_at`. The check and the write are one atomic step.
    ///
    /// # Errors
    ///
    /// [`QueueError::TicketNotFound`] if absent,
    /// [`QueueError::InvalidTransition`] if the current status forbids it.
    fn transition(
        &self,
        id: i64,
        to: TicketStatus,
        counter: Option<i32>,
    ) -> impl Future<Output = Result<Ticket, QueueError>> + Send;

    /// Atomically takes the lowest-id waiting ticket of today in
    /// `category_id` and moves it to `calling` on `counter`.
    ///
    /// Returns `None` when nobody is waiting.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn claim_next_waiting(
        &self,
        category_id: i32,
        counter: i32,
    ) -> impl Future<Output = Result<Option<Ticket>, QueueError>> + Send;

    /// Today's waiting tickets ordered by category, then id.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn list_waiting(&self) -> impl Future<Output = Result<Vec<Ticket>, QueueError>> + Send;

    /// The `limit` most recent tickets of any day and status, id descending.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn list_recent(&self, limit: i64)
    -> impl Future<Output = Result<Vec<Ticket>, QueueError>> + Send;

    /// Today's counts per status.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn stats(&self) -> impl Future<Output = Result<QueueStats, QueueError>> + Send;

    /// Deletes every ticket created today and returns how many were removed.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn reset_today(&self) -> impl Future<Output = Result<u64, QueueError>> + Send;

    /// All categories ordered by id.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>, QueueError>> + Send;

    /// Reads the display settings singleton.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn display_settings(&self)
    -> impl Future<Output = Result<DisplaySettings, QueueError>> + Send;

    /// Overwrites the display settings singleton.
    ///
    /// # Errors
    ///
    /// [`QueueError::StoreUnavailable`] on datastore failure.
    fn update_display_settings(
        &self,
        settings: &DisplaySettings,
    ) -> impl Future<Output = Result<(), QueueError>> + Send;
}

/// Backend selected at startup.
#[derive(Debug, Clone)]
pub enum Store {
    /// PostgreSQL via `sqlx`.
    Postgres(PostgresStore),
    /// In-process maps.
    Memory(MemoryStore),
}

impl TicketStore for Store {
    async fn create_ticket(&self, category_id: i32) -> Result<Ticket, QueueError> {
        match self {
            Self::Postgres(store) => store.create_ticket(category_id).await,
            Self::Memory(store) => store.create_ticket(category_id).await,
        }
    }

    async fn get_ticket(&self, id: i64) -> Result<Ticket, QueueError> {
        match self {
            Self::Postgres(store) => store.get_ticket(id).await,
            Self::Memory(store) => store.get_ticket(id).await,
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Ticket, QueueError> {
        match self {
            Self::Postgres(store) => store.find_by_code(code).await,
            Self::Memory(store) => store.find_by_code(code).await,
        }
    }

    async fn transition(
        &self,
        id: i64,
        to: TicketStatus,
        counter: Option<i32>,
    ) -> Result<Ticket, QueueError> {
        match self {
            Self::Postgres(store) => store.transition(id, to, counter).await,
            Self::Memory(store) => store.transition(id, to, counter).await,
        }
    }

    async fn claim_next_waiting(
        &self,
        category_id: i32,
        counter: i32,
    ) -> Result<Option<Ticket>, QueueError> {
        match self {
            Self::Postgres(store) => store.claim_next_waiting(category_id, counter).await,
            Self::Memory(store) => store.claim_next_waiting(category_id, counter).await,
        }
    }

    async fn list_waiting(&self) -> Result<Vec<Ticket>, QueueError> {
        match self {
            Self::Postgres(store) => store.list_waiting().await,
            Self::Memory(store) => store.list_waiting().await,
        }
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Ticket>, QueueError> {
        match self {
            Self::Postgres(store) => store.list_recent(limit).await,
            Self::Memory(store) => store.list_recent(limit).await,
        }
    }

    async fn stats(&self) -> Result<QueueStats, QueueError> {
        match self {
            Self::Postgres(store) => store.stats().await,
            Self::Memory(store) => store.stats().await,
        }
    }

    async fn reset_today(&self) -> Result<u64, QueueError> {
        match self {
            Self::Postgres(store) => store.reset_today().await,
            Self::Memory(store) => store.reset_today().await,
        }
    }

    async fn categories(&self) -> Result<Vec<Category>, QueueError> {
        match self {
            Self::Postgres(store) => store.categories().await,
            Self::Memory(store) => store.categories().await,
        }
    }

    async fn display_settings(&self) -> Result<DisplaySettings, QueueError> {
        match self {
            Self::Postgres(store) => store.display_settings().await,
            Self::Memory(store) => store.display_settings().await,
        }
    }

    async fn update_display_settings(&self, settings: &DisplaySettings) -> Result<(), QueueError> {
        match self {
            Self::Postgres(store) => store.update_display_settings(settings).await,
            Self::Memory(store) => store.update_display_settings(settings).await,
        }
    }
}
