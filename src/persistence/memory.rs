//! In-memory implementation of the ticket store.
//!
//! All state sits behind one async mutex, so every operation runs as a
//! serialized critical section: the read-max-then-insert of ticket creation
//! can never interleave with another creation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use super::TicketStore;
use crate::domain::{Category, DisplaySettings, QueueStats, Ticket, TicketStatus, format_code};
use crate::error::QueueError;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug)]
struct MemoryState {
    categories: Vec<Category>,
    /// Keyed by id, so iteration order is creation order.
    tickets: BTreeMap<i64, Ticket>,
    last_id: i64,
    display: DisplaySettings,
}

impl MemoryState {
    fn today_tickets(&self, today: NaiveDate) -> impl Iterator<Item = &Ticket> {
        self.tickets
            .values()
            .filter(move |t| t.created_at.date_naive() == today)
    }
}

/// Process-local ticket store with the same semantics as
/// [`super::PostgresStore`].
///
/// Clones share state. The clock is injectable so day rollover can be
/// exercised without waiting for midnight.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    clock: Clock,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Creates an empty store seeded with [`Category::defaults`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_categories(Category::defaults())
    }

    /// Creates an empty store with the given categories.
    #[must_use]
    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                categories,
                tickets: BTreeMap::new(),
                last_id: 0,
                display: DisplaySettings::default(),
            })),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock used for timestamps and "today".
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketStore for MemoryStore {
    async fn create_ticket(&self, category_id: i32) -> Result<Ticket, QueueError> {
        let mut state = self.state.lock().await;
        let now = self.now();
        let today = now.date_naive();

        let prefix = state
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.prefix.clone())
            .ok_or(QueueError::CategoryNotFound(category_id))?;

        let last = state
            .today_tickets(today)
            .filter(|t| t.category_id == category_id)
            .map(|t| t.ticket_number)
            .max()
            .unwrap_or(0);
        let ticket_number = last
            .checked_add(1)
            .ok_or_else(|| QueueError::Internal("ticket number overflow".to_string()))?;

        state.last_id += 1;
        let ticket = Ticket {
            id: state.last_id,
            category_id,
            ticket_number,
            formatted_code: format_code(&prefix, ticket_number),
            status: TicketStatus::Waiting,
            counter: 0,
            created_at: now,
            updated_at: now,
        };
        state.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn get_ticket(&self, id: i64) -> Result<Ticket, QueueError> {
        let state = self.state.lock().await;
        state
            .tickets
            .get(&id)
            .cloned()
            .ok_or(QueueError::TicketNotFound(id))
    }

    async fn find_by_code(&self, code: &str) -> Result<Ticket, QueueError> {
        let state = self.state.lock().await;
        let today = self.now().date_naive();
        state
            .today_tickets(today)
            .find(|t| t.formatted_code == code)
            .cloned()
            .ok_or_else(|| QueueError::TicketCodeNotFound(code.to_string()))
    }

    async fn transition(
        &self,
        id: i64,
        to: TicketStatus,
        counter: Option<i32>,
    ) -> Result<Ticket, QueueError> {
        let mut state = self.state.lock().await;
        let now = self.now();
        let ticket = state
            .tickets
            .get_mut(&id)
            .ok_or(QueueError::TicketNotFound(id))?;

        if !ticket.status.can_transition_to(to) {
            return Err(QueueError::InvalidTransition {
                id,
                from: ticket.status,
                to,
            });
        }

        ticket.status = to;
        if let Some(counter) = counter {
            ticket.counter = counter;
        }
        ticket.updated_at = now;
        Ok(ticket.clone())
    }

    async fn claim_next_waiting(
        &self,
        category_id: i32,
        counter: i32,
    ) -> Result<Option<Ticket>, QueueError> {
        let mut state = self.state.lock().await;
        let now = self.now();
        let today = now.date_naive();

        let next = state.tickets.values_mut().find(|t| {
            t.category_id == category_id
                && t.status == TicketStatus::Waiting
                && t.created_at.date_naive() == today
        });
        Ok(next.map(|ticket| {
            ticket.status = TicketStatus::Calling;
            ticket.counter = counter;
            ticket.updated_at = now;
            ticket.clone()
        }))
    }

    async fn list_waiting(&self) -> Result<Vec<Ticket>, QueueError> {
        let state = self.state.lock().await;
        let today = self.now().date_naive();
        let mut waiting: Vec<Ticket> = state
            .today_tickets(today)
            .filter(|t| t.status == TicketStatus::Waiting)
            .cloned()
            .collect();
        waiting.sort_by_key(|t| (t.category_id, t.id));
        Ok(waiting)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Ticket>, QueueError> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state.tickets.values().rev().take(limit).cloned().collect())
    }

    async fn stats(&self) -> Result<QueueStats, QueueError> {
        let state = self.state.lock().await;
        let today = self.now().date_naive();
        Ok(QueueStats::tally(state.today_tickets(today).map(|t| t.status)))
    }

    async fn reset_today(&self) -> Result<u64, QueueError> {
        let mut state = self.state.lock().await;
        let today = self.now().date_naive();
        let before = state.tickets.len();
        state
            .tickets
            .retain(|_, t| t.created_at.date_naive() != today);
        let removed = before.saturating_sub(state.tickets.len());
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn categories(&self) -> Result<Vec<Category>, QueueError> {
        let state = self.state.lock().await;
        let mut categories = state.categories.clone();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn display_settings(&self) -> Result<DisplaySettings, QueueError> {
        Ok(self.state.lock().await.display.clone())
    }

    async fn update_display_settings(&self, settings: &DisplaySettings) -> Result<(), QueueError> {
        self.state.lock().await.display = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::TimeZone;

    /// A store whose clock sits at a fixed instant shifted by `offset` days.
    fn store_with_day_offset() -> (MemoryStore, Arc<AtomicI64>) {
        let Some(base) = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).single() else {
            panic!("valid timestamp");
        };
        let offset = Arc::new(AtomicI64::new(0));
        let clock_offset = Arc::clone(&offset);
        let store = MemoryStore::new().with_clock(move || {
            base + chrono::Duration::days(clock_offset.load(Ordering::SeqCst))
        });
        (store, offset)
    }

    async fn create(store: &MemoryStore, category_id: i32) -> Ticket {
        let Ok(ticket) = store.create_ticket(category_id).await else {
            panic!("create_ticket failed");
        };
        ticket
    }

    #[tokio::test]
    async fn first_ticket_is_number_one() {
        let store = MemoryStore::new();
        let ticket = create(&store, 1).await;
        assert_eq!(ticket.ticket_number, 1);
        assert_eq!(ticket.formatted_code, "A-001");
        assert_eq!(ticket.status, TicketStatus::Waiting);
        assert_eq!(ticket.counter, 0);
    }

    #[tokio::test]
    async fn seventh_ticket_formats_as_a_007() {
        let store = MemoryStore::new();
        let mut last = create(&store, 1).await;
        for _ in 1..7 {
            last = create(&store, 1).await;
        }
        assert_eq!(last.formatted_code, "A-007");
    }

    #[tokio::test]
    async fn categories_number_independently() {
        let store = MemoryStore::new();
        create(&store, 1).await;
        create(&store, 1).await;
        let b = create(&store, 2).await;
        assert_eq!(b.formatted_code, "B-001");
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let store = MemoryStore::new();
        let result = store.create_ticket(42).await;
        assert!(matches!(result, Err(QueueError::CategoryNotFound(42))));
    }

    #[tokio::test]
    async fn concurrent_creates_yield_contiguous_numbers() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.create_ticket(1).await }));
        }

        let mut numbers = BTreeSet::new();
        for handle in handles {
            let Ok(Ok(ticket)) = handle.await else {
                panic!("concurrent create failed");
            };
            assert!(numbers.insert(ticket.ticket_number), "duplicate number");
        }
        assert_eq!(numbers, (1..=50).collect::<BTreeSet<i32>>());
    }

    #[tokio::test]
    async fn numbering_restarts_each_day() {
        let (store, offset) = store_with_day_offset();
        offset.store(-1, Ordering::SeqCst);
        let mut yesterday = create(&store, 1).await;
        for _ in 1..12 {
            yesterday = create(&store, 1).await;
        }
        assert_eq!(yesterday.ticket_number, 12);

        offset.store(0, Ordering::SeqCst);
        let today = create(&store, 1).await;
        assert_eq!(today.ticket_number, 1);
        assert_eq!(today.formatted_code, "A-001");
        assert!(today.id > yesterday.id);
    }

    #[tokio::test]
    async fn find_by_code_only_sees_today() {
        let (store, offset) = store_with_day_offset();
        offset.store(-1, Ordering::SeqCst);
        create(&store, 1).await;

        offset.store(0, Ordering::SeqCst);
        assert!(matches!(
            store.find_by_code("A-001").await,
            Err(QueueError::TicketCodeNotFound(_))
        ));

        let today = create(&store, 1).await;
        let Ok(found) = store.find_by_code("A-001").await else {
            panic!("expected today's ticket");
        };
        assert_eq!(found.id, today.id);
    }

    #[tokio::test]
    async fn call_sets_status_counter_and_timestamp() {
        let store = MemoryStore::new();
        let ticket = create(&store, 1).await;

        let Ok(called) = store
            .transition(ticket.id, TicketStatus::Calling, Some(3))
            .await
        else {
            panic!("call failed");
        };
        assert_eq!(called.status, TicketStatus::Calling);
        assert_eq!(called.counter, 3);
        assert!(called.updated_at >= ticket.updated_at);
        assert_eq!(called.created_at, ticket.created_at);
        assert_eq!(called.formatted_code, ticket.formatted_code);
    }

    #[tokio::test]
    async fn recall_to_another_counter_is_allowed() {
        let store = MemoryStore::new();
        let ticket = create(&store, 1).await;
        let _ = store.transition(ticket.id, TicketStatus::Calling, Some(1)).await;
        let Ok(again) = store
            .transition(ticket.id, TicketStatus::Calling, Some(4))
            .await
        else {
            panic!("re-call failed");
        };
        assert_eq!(again.counter, 4);
    }

    #[tokio::test]
    async fn terminal_tickets_do_not_move() {
        let store = MemoryStore::new();
        let finished = create(&store, 1).await;
        let skipped = create(&store, 1).await;
        assert!(store
            .transition(finished.id, TicketStatus::Finished, None)
            .await
            .is_ok());
        assert!(store
            .transition(skipped.id, TicketStatus::Skipped, None)
            .await
            .is_ok());

        for target in TicketStatus::ALL {
            let result = store.transition(finished.id, target, Some(2)).await;
            assert!(matches!(result, Err(QueueError::InvalidTransition { .. })));
            let result = store.transition(skipped.id, target, Some(2)).await;
            assert!(matches!(result, Err(QueueError::InvalidTransition { .. })));
        }

        let Ok(still_finished) = store.get_ticket(finished.id).await else {
            panic!("ticket vanished");
        };
        assert_eq!(still_finished.status, TicketStatus::Finished);
        assert_eq!(still_finished.counter, 0);
    }

    #[tokio::test]
    async fn transition_on_missing_ticket_is_not_found() {
        let store = MemoryStore::new();
        let result = store.transition(99, TicketStatus::Finished, None).await;
        assert!(matches!(result, Err(QueueError::TicketNotFound(99))));
    }

    #[tokio::test]
    async fn waiting_list_is_fifo_per_category() {
        let store = MemoryStore::new();
        let a1 = create(&store, 1).await;
        let b1 = create(&store, 2).await;
        let a2 = create(&store, 1).await;
        let b2 = create(&store, 2).await;
        let a3 = create(&store, 1).await;

        // Calling in category 2 must not disturb category 1's order.
        let _ = store.transition(b1.id, TicketStatus::Calling, Some(1)).await;

        let Ok(waiting) = store.list_waiting().await else {
            panic!("list_waiting failed");
        };
        let ids: Vec<i64> = waiting.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a1.id, a2.id, a3.id, b2.id]);
    }

    #[tokio::test]
    async fn claim_next_takes_lowest_waiting_id() {
        let store = MemoryStore::new();
        let first = create(&store, 1).await;
        let second = create(&store, 1).await;
        let _ = store.transition(first.id, TicketStatus::Skipped, None).await;

        let Ok(Some(claimed)) = store.claim_next_waiting(1, 2).await else {
            panic!("expected a waiting ticket");
        };
        assert_eq!(claimed.id, second.id);
        assert_eq!(claimed.status, TicketStatus::Calling);
        assert_eq!(claimed.counter, 2);

        assert!(matches!(store.claim_next_waiting(1, 2).await, Ok(None)));
    }

    #[tokio::test]
    async fn recent_returns_last_five_descending() {
        let store = MemoryStore::new();
        for _ in 0..7 {
            create(&store, 1).await;
        }
        let Ok(recent) = store.list_recent(5).await else {
            panic!("list_recent failed");
        };
        let ids: Vec<i64> = recent.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[tokio::test]
    async fn stats_count_today_only() {
        let (store, offset) = store_with_day_offset();
        offset.store(-1, Ordering::SeqCst);
        create(&store, 1).await;

        offset.store(0, Ordering::SeqCst);
        let a = create(&store, 1).await;
        let b = create(&store, 1).await;
        create(&store, 2).await;
        let _ = store.transition(a.id, TicketStatus::Calling, Some(1)).await;
        let _ = store.transition(b.id, TicketStatus::Skipped, None).await;

        let Ok(stats) = store.stats().await else {
            panic!("stats failed");
        };
        assert_eq!(stats.waiting, 1);
        assert_eq!(stats.calling, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.finished, 0);
        assert_eq!(stats.total, 3);
    }

    #[tokio::test]
    async fn reset_twice_is_a_noop_the_second_time() {
        let (store, offset) = store_with_day_offset();
        offset.store(-1, Ordering::SeqCst);
        create(&store, 1).await;
        offset.store(0, Ordering::SeqCst);
        create(&store, 1).await;
        create(&store, 2).await;

        assert!(matches!(store.reset_today().await, Ok(2)));
        assert!(matches!(store.reset_today().await, Ok(0)));

        let Ok(stats) = store.stats().await else {
            panic!("stats failed");
        };
        assert_eq!(stats.total, 0);
        // Yesterday's ticket is untouched.
        let Ok(recent) = store.list_recent(5).await else {
            panic!("list_recent failed");
        };
        assert_eq!(recent.len(), 1);
    }

    #[tokio::test]
    async fn display_settings_are_replaced_wholesale() {
        let store = MemoryStore::new();
        let settings = DisplaySettings {
            video_url: "https://cdn.example/loop.mp4".to_string(),
            title: "Welcome".to_string(),
            subtitle: String::new(),
        };
        assert!(store.update_display_settings(&settings).await.is_ok());
        let Ok(read) = store.display_settings().await else {
            panic!("display_settings failed");
        };
        assert_eq!(read, settings);
    }
}
