//! Queue service: runs lifecycle operations and emits events.

use std::sync::Arc;

use crate::domain::{
    CallBoard, Category, DisplaySettings, QueueEvent, QueueStats, Ticket, TicketStatus,
};
use crate::error::QueueError;
use crate::hub::Hub;
use crate::persistence::{RECENT_LIMIT, TicketStore};

/// Orchestration layer for all queue operations.
///
/// Owns a reference to the [`TicketStore`] for state, the [`Hub`] for
/// event emission and the [`CallBoard`] for recalls. Every mutation method
/// follows the same pattern: run the engine operation, and only if it
/// succeeded build the event and publish it. Publishing never fails the
/// request, and a failed operation publishes nothing.
#[derive(Debug)]
pub struct QueueService<S> {
    store: Arc<S>,
    hub: Hub,
    call_board: CallBoard,
}

impl<S> Clone for QueueService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hub: self.hub.clone(),
            call_board: self.call_board.clone(),
        }
    }
}

impl<S: TicketStore> QueueService<S> {
    /// Creates a new `QueueService`.
    #[must_use]
    pub fn new(store: Arc<S>, hub: Hub, call_board: CallBoard) -> Self {
        Self {
            store,
            hub,
            call_board,
        }
    }

    /// Returns a reference to the inner [`Hub`].
    #[must_use]
    pub const fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Returns a reference to the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Issues the next ticket in `category_id` and announces it.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::CategoryNotFound`] for an unknown category or a
    /// store error.
    pub async fn create_ticket(&self, category_id: i32) -> Result<Ticket, QueueError> {
        let ticket = self.store.create_ticket(category_id).await?;
        tracing::info!(
            ticket_id = ticket.id,
            code = %ticket.formatted_code,
            category_id,
            "ticket created"
        );
        self.hub.publish(QueueEvent::NewTicket(ticket.clone()));
        Ok(ticket)
    }

    /// Calls ticket `ticket_id` to `counter`.
    ///
    /// Calling a ticket that is already `calling` re-announces it, possibly
    /// on another counter.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::InvalidRequest`] for a counter below 1,
    /// [`QueueError::TicketNotFound`] or [`QueueError::InvalidTransition`].
    pub async fn call_ticket(&self, ticket_id: i64, counter: i32) -> Result<Ticket, QueueError> {
        validate_counter(counter)?;
        let epoch = self.call_board.epoch();
        let ticket = self
            .store
            .transition(ticket_id, TicketStatus::Calling, Some(counter))
            .await?;
        self.announce_call(ticket.clone(), epoch);
        Ok(ticket)
    }

    /// Calls today's ticket carrying `code` to `counter`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::TicketCodeNotFound`] when no ticket of today
    /// matches, otherwise the same failures as [`Self::call_ticket`].
    pub async fn call_by_code(&self, code: &str, counter: i32) -> Result<Ticket, QueueError> {
        validate_counter(counter)?;
        let found = self.store.find_by_code(code.trim()).await?;
        self.call_ticket(found.id, counter).await
    }

    /// Takes the oldest waiting ticket of today in `category_id` and calls
    /// it to `counter`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NoWaitingTicket`] when nobody is waiting in the
    /// category.
    pub async fn call_next(&self, category_id: i32, counter: i32) -> Result<Ticket, QueueError> {
        validate_counter(counter)?;
        let epoch = self.call_board.epoch();
        let ticket = self
            .store
            .claim_next_waiting(category_id, counter)
            .await?
            .ok_or(QueueError::NoWaitingTicket(category_id))?;
        self.announce_call(ticket.clone(), epoch);
        Ok(ticket)
    }

    /// Re-announces the last ticket called on `counter`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NothingToRecall`] if the counter has not called
    /// anything since startup or the last reset.
    pub async fn recall(&self, counter: i32) -> Result<Ticket, QueueError> {
        let ticket = self
            .call_board
            .last_called(counter)
            .await
            .ok_or(QueueError::NothingToRecall(counter))?;
        tracing::info!(ticket_id = ticket.id, counter, "ticket recalled");
        self.hub.publish(QueueEvent::CallTicket(ticket.clone()));
        Ok(ticket)
    }

    /// Marks a called ticket as being served.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::TicketNotFound`] or
    /// [`QueueError::InvalidTransition`].
    pub async fn start_serving(&self, ticket_id: i64) -> Result<Ticket, QueueError> {
        self.move_quietly(ticket_id, TicketStatus::Serving).await
    }

    /// Marks a ticket as skipped.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::TicketNotFound`] or
    /// [`QueueError::InvalidTransition`].
    pub async fn skip(&self, ticket_id: i64) -> Result<Ticket, QueueError> {
        self.move_quietly(ticket_id, TicketStatus::Skipped).await
    }

    /// Marks a ticket as finished.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::TicketNotFound`] or
    /// [`QueueError::InvalidTransition`].
    pub async fn finish(&self, ticket_id: i64) -> Result<Ticket, QueueError> {
        self.move_quietly(ticket_id, TicketStatus::Finished).await
    }

    /// Deletes today's tickets, forgets every counter's last call and tells
    /// displays to clear.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::StoreUnavailable`] if the delete fails.
    pub async fn reset(&self) -> Result<u64, QueueError> {
        let deleted = self.store.reset_today().await?;
        self.call_board.clear();
        tracing::warn!(deleted, "queue reset");
        self.hub.publish(QueueEvent::ResetQueue);
        Ok(deleted)
    }

    /// Today's waiting tickets, by category then id.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn waiting(&self) -> Result<Vec<Ticket>, QueueError> {
        self.store.list_waiting().await
    }

    /// The most recently issued tickets.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn recent(&self) -> Result<Vec<Ticket>, QueueError> {
        self.store.list_recent(RECENT_LIMIT).await
    }

    /// Today's per-status counts.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn stats(&self) -> Result<QueueStats, QueueError> {
        self.store.stats().await
    }

    /// All service categories.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn categories(&self) -> Result<Vec<Category>, QueueError> {
        self.store.categories().await
    }

    /// Looks up today's ticket by its printed code.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::TicketCodeNotFound`] when nothing matches.
    pub async fn find_by_code(&self, code: &str) -> Result<Ticket, QueueError> {
        self.store.find_by_code(code.trim()).await
    }

    /// Current display settings.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn display_settings(&self) -> Result<DisplaySettings, QueueError> {
        self.store.display_settings().await
    }

    /// Replaces the display settings and pushes them to every display.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn update_display_settings(
        &self,
        settings: DisplaySettings,
    ) -> Result<DisplaySettings, QueueError> {
        self.store.update_display_settings(&settings).await?;
        tracing::info!(title = %settings.title, "display settings updated");
        self.hub.publish(QueueEvent::UpdateVideo(settings.clone()));
        Ok(settings)
    }

    fn announce_call(&self, ticket: Ticket, epoch: u64) {
        tracing::info!(
            ticket_id = ticket.id,
            code = %ticket.formatted_code,
            counter = ticket.counter,
            "ticket called"
        );
        self.call_board.record(ticket.counter, ticket.clone(), epoch);
        self.hub.publish(QueueEvent::CallTicket(ticket));
    }

    async fn move_quietly(&self, ticket_id: i64, to: TicketStatus) -> Result<Ticket, QueueError> {
        let ticket = self.store.transition(ticket_id, to, None).await?;
        tracing::info!(ticket_id, status = %to, "ticket status changed");
        Ok(ticket)
    }
}

fn validate_counter(counter: i32) -> Result<(), QueueError> {
    if counter < 1 {
        return Err(QueueError::InvalidRequest(format!(
            "counter must be at least 1, got {counter}"
        )));
    }
    Ok(())
}
