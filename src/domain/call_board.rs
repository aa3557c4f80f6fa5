//! Last-called ticket per counter, owned by a single task.
//!
//! [`CallBoard`] backs the "recall" action: re-announcing what a counter
//! called last without touching the datastore. The map lives inside one
//! spawned task and is only reached through a command queue, so reads and
//! writes from concurrent requests are applied one at a time in arrival
//! order.
//!
//! A reset bumps the board's epoch. Callers read [`CallBoard::epoch`]
//! before touching the store and pass it to [`CallBoard::record`]; a record
//! tagged with an epoch older than the last clear is dropped, so a call
//! that committed just before a reset cannot reappear after it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};

use super::Ticket;

/// Commands processed by the call board task.
#[derive(Debug)]
enum BoardCommand {
    Record {
        counter: i32,
        ticket: Ticket,
        epoch: u64,
    },
    Get {
        counter: i32,
        reply: oneshot::Sender<Option<Ticket>>,
    },
    Clear {
        epoch: u64,
    },
}

/// Handle to the call board task. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CallBoard {
    commands: mpsc::UnboundedSender<BoardCommand>,
    epoch: Arc<AtomicU64>,
}

impl CallBoard {
    /// Spawns the owning task on the current tokio runtime.
    ///
    /// The task exits once every handle has been dropped.
    #[must_use]
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_board(rx));
        Self {
            commands,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of clears so far. Read it before the store operation whose
    /// result will be recorded.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Remembers `ticket` as the last call on `counter`.
    ///
    /// Ignored if a clear happened after `epoch` was read.
    pub fn record(&self, counter: i32, ticket: Ticket, epoch: u64) {
        if self
            .commands
            .send(BoardCommand::Record {
                counter,
                ticket,
                epoch,
            })
            .is_err()
        {
            tracing::warn!(counter, "call board stopped; call not recorded");
        }
    }

    /// Returns the last ticket called on `counter`, if any.
    pub async fn last_called(&self, counter: i32) -> Option<Ticket> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(BoardCommand::Get { counter, reply })
            .ok()?;
        rx.await.ok().flatten()
    }

    /// Forgets every counter's last call.
    pub fn clear(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        let _ = self.commands.send(BoardCommand::Clear { epoch });
    }
}

async fn run_board(mut rx: mpsc::UnboundedReceiver<BoardCommand>) {
    let mut last_calls: HashMap<i32, (u64, Ticket)> = HashMap::new();
    let mut current = 0_u64;

    while let Some(command) = rx.recv().await {
        match command {
            BoardCommand::Record {
                counter,
                ticket,
                epoch,
            } => {
                if epoch < current {
                    tracing::debug!(
                        counter,
                        ticket_id = ticket.id,
                        "stale call ignored after reset"
                    );
                    continue;
                }
                last_calls.insert(counter, (epoch, ticket));
            }
            BoardCommand::Get { counter, reply } => {
                let _ = reply.send(last_calls.get(&counter).map(|(_, t)| t.clone()));
            }
            // A record tagged with the new epoch may arrive before this command.
            BoardCommand::Clear { epoch } => {
                current = current.max(epoch);
                last_calls.retain(|_, (recorded, _)| *recorded >= current);
            }
        }
    }

    tracing::debug!("call board stopped");
}
