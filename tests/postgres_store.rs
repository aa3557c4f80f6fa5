//! PostgreSQL store tests.
//!
//! Skipped unless `TEST_DATABASE_URL` points at a disposable database; the
//! tests apply migrations and reset today's tickets.

#![allow(clippy::panic)]

use std::collections::BTreeSet;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;

use queue_gateway::domain::TicketStatus;
use queue_gateway::error::QueueError;
use queue_gateway::persistence::{PostgresStore, TicketStore};

// The tests share one database and each resets today's queue.
static SERIAL: Mutex<()> = Mutex::const_new(());

async fn connect() -> Option<PostgresStore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let Ok(pool) = PgPoolOptions::new().max_connections(20).connect(&url).await else {
        panic!("cannot connect to TEST_DATABASE_URL");
    };
    let store = PostgresStore::new(pool);
    let Ok(()) = store.migrate().await else {
        panic!("migrations failed");
    };
    let Ok(_) = store.reset_today().await else {
        panic!("reset failed");
    };
    Some(store)
}

#[tokio::test]
async fn concurrent_creates_get_distinct_numbers() {
    let _guard = SERIAL.lock().await;
    let Some(store) = connect().await else {
        return;
    };

    let mut handles = Vec::new();
    for _ in 0..30 {
        let store = store.clone();
        handles.push(tokio::spawn(async move { store.create_ticket(1).await }));
    }

    let mut numbers = BTreeSet::new();
    for handle in handles {
        let Ok(Ok(ticket)) = handle.await else {
            panic!("create failed");
        };
        numbers.insert(ticket.ticket_number);
    }
    assert_eq!(numbers, (1..=30).collect::<BTreeSet<_>>());
}

#[tokio::test]
async fn lifecycle_and_terminal_states() {
    let _guard = SERIAL.lock().await;
    let Some(store) = connect().await else {
        return;
    };

    let Ok(ticket) = store.create_ticket(2).await else {
        panic!("create failed");
    };
    assert_eq!(ticket.formatted_code, "B-001");
    assert_eq!(ticket.status, TicketStatus::Waiting);

    let Ok(called) = store
        .transition(ticket.id, TicketStatus::Calling, Some(4))
        .await
    else {
        panic!("call failed");
    };
    assert_eq!(called.counter, 4);
    assert!(called.updated_at >= ticket.updated_at);

    let Ok(_) = store.transition(ticket.id, TicketStatus::Finished, None).await else {
        panic!("finish failed");
    };
    let refused = store.transition(ticket.id, TicketStatus::Calling, Some(1)).await;
    assert!(matches!(
        refused,
        Err(QueueError::InvalidTransition {
            from: TicketStatus::Finished,
            ..
        })
    ));

    let missing = store.transition(i64::MAX, TicketStatus::Skipped, None).await;
    assert!(matches!(missing, Err(QueueError::TicketNotFound(_))));
}

#[tokio::test]
async fn claim_next_and_lookup() {
    let _guard = SERIAL.lock().await;
    let Some(store) = connect().await else {
        return;
    };

    let Ok(first) = store.create_ticket(3).await else {
        panic!("create failed");
    };
    let Ok(_) = store.create_ticket(3).await else {
        panic!("create failed");
    };

    let Ok(Some(claimed)) = store.claim_next_waiting(3, 2).await else {
        panic!("claim failed");
    };
    assert_eq!(claimed.id, first.id);
    assert_eq!(claimed.status, TicketStatus::Calling);

    let Ok(found) = store.find_by_code("C-002").await else {
        panic!("lookup failed");
    };
    assert_eq!(found.status, TicketStatus::Waiting);

    let Ok(stats) = store.stats().await else {
        panic!("stats failed");
    };
    assert_eq!(stats.waiting, 1);
    assert_eq!(stats.calling, 1);

    let unknown = store.create_ticket(999).await;
    assert!(matches!(unknown, Err(QueueError::CategoryNotFound(999))));
}

#[tokio::test]
async fn reset_twice_leaves_zero() {
    let _guard = SERIAL.lock().await;
    let Some(store) = connect().await else {
        return;
    };

    let Ok(_) = store.create_ticket(1).await else {
        panic!("create failed");
    };
    let Ok(deleted) = store.reset_today().await else {
        panic!("reset failed");
    };
    assert_eq!(deleted, 1);
    let Ok(deleted) = store.reset_today().await else {
        panic!("second reset failed");
    };
    assert_eq!(deleted, 0);

    let Ok(stats) = store.stats().await else {
        panic!("stats failed");
    };
    assert_eq!(stats.total, 0);
}
