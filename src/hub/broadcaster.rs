//! Single-owner fan-out hub for real-time subscribers.
//!
//! [`Hub`] is a handle to one spawned task that owns the membership map.
//! Register, unregister, publish and count requests all travel through a
//! single command queue and are applied one at a time in arrival order, so
//! membership is never mutated concurrently.
//!
//! Each subscriber gets a bounded outbox. Publishing uses `try_send` on every
//! outbox: a subscriber that is full or gone is removed on the spot instead of
//! being waited on, so one slow display never stalls the others or the
//! request that produced the event.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::domain::QueueEvent;

/// Event shared between all outboxes of one fan-out.
pub type SharedEvent = Arc<QueueEvent>;

/// Failures visible to callers of the hub handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// The hub task is no longer running.
    #[error("broadcast hub has stopped")]
    Closed,
}

#[derive(Debug)]
enum HubCommand {
    Register {
        id: Uuid,
        outbox: mpsc::Sender<SharedEvent>,
        ack: oneshot::Sender<()>,
    },
    Unregister(Uuid),
    Publish(SharedEvent),
    Count(oneshot::Sender<usize>),
}

/// Handle to the hub task. Cheap to clone; all clones address the same
/// membership set.
#[derive(Debug, Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<HubCommand>,
    subscriber_buffer: usize,
}

impl Hub {
    /// Spawns the hub task on the current tokio runtime.
    ///
    /// `subscriber_buffer` bounds each subscriber's outbox; a subscriber
    /// that falls that many events behind is dropped.
    #[must_use]
    pub fn spawn(subscriber_buffer: usize) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_hub(rx));
        Self {
            commands,
            subscriber_buffer: subscriber_buffer.max(1),
        }
    }

    /// Registers a new subscriber.
    ///
    /// Returns once the hub has admitted it: every event published after
    /// this call returns is delivered to the subscription. Earlier events
    /// are never replayed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the hub task has stopped.
    pub async fn subscribe(&self) -> Result<Subscription, HubError> {
        let id = Uuid::new_v4();
        let (outbox, inbox) = mpsc::channel(self.subscriber_buffer);
        let (ack, acked) = oneshot::channel();

        self.commands
            .send(HubCommand::Register { id, outbox, ack })
            .map_err(|_| HubError::Closed)?;
        acked.await.map_err(|_| HubError::Closed)?;

        Ok(Subscription {
            id,
            inbox,
            hub: self.commands.downgrade(),
        })
    }

    /// Removes a subscriber. Unknown or already-removed ids are ignored.
    pub fn unregister(&self, id: Uuid) {
        let _ = self.commands.send(HubCommand::Unregister(id));
    }

    /// Queues `event` for delivery to every registered subscriber.
    ///
    /// Never waits on subscribers. Returns `false` only if the hub task has
    /// stopped, in which case the event is dropped.
    pub fn publish(&self, event: QueueEvent) -> bool {
        let event_type = event.event_type_str();
        let queued = self
            .commands
            .send(HubCommand::Publish(Arc::new(event)))
            .is_ok();
        if !queued {
            tracing::warn!(event_type, "broadcast hub stopped; event dropped");
        }
        queued
    }

    /// Returns the number of currently registered subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the hub task has stopped.
    pub async fn subscriber_count(&self) -> Result<usize, HubError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(HubCommand::Count(reply))
            .map_err(|_| HubError::Closed)?;
        rx.await.map_err(|_| HubError::Closed)
    }
}

/// A registered subscriber's receiving end.
///
/// Dropping the subscription unregisters it from the hub.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    inbox: mpsc::Receiver<SharedEvent>,
    hub: mpsc::WeakUnboundedSender<HubCommand>,
}

impl Subscription {
    /// Returns this subscriber's membership key, a random UUID v4.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the hub has dropped this subscriber (outbox
    /// overflow or hub shutdown) and every buffered event was consumed.
    pub async fn recv(&mut self) -> Option<SharedEvent> {
        self.inbox.recv().await
    }

    /// Returns the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<SharedEvent> {
        self.inbox.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(commands) = self.hub.upgrade() {
            let _ = commands.send(HubCommand::Unregister(self.id));
        }
    }
}

async fn run_hub(mut rx: mpsc::UnboundedReceiver<HubCommand>) {
    let mut members: HashMap<Uuid, mpsc::Sender<SharedEvent>> = HashMap::new();

    while let Some(command) = rx.recv().await {
        match command {
            HubCommand::Register { id, outbox, ack } => {
                members.insert(id, outbox);
                tracing::debug!(subscriber = %id, active = members.len(), "subscriber registered");
                let _ = ack.send(());
            }
            HubCommand::Unregister(id) => {
                if members.remove(&id).is_some() {
                    tracing::debug!(subscriber = %id, active = members.len(), "subscriber unregistered");
                }
            }
            HubCommand::Publish(event) => {
                let delivered = fan_out(&mut members, &event);
                tracing::debug!(
                    event_type = event.event_type_str(),
                    delivered,
                    "event published"
                );
            }
            HubCommand::Count(reply) => {
                let _ = reply.send(members.len());
            }
        }
    }

    tracing::debug!("broadcast hub stopped");
}

/// Offers `event` to every outbox, dropping members that cannot take it.
fn fan_out(
    members: &mut HashMap<Uuid, mpsc::Sender<SharedEvent>>,
    event: &SharedEvent,
) -> usize {
    let mut delivered = 0usize;
    members.retain(|id, outbox| match outbox.try_send(Arc::clone(event)) {
        Ok(()) => {
            delivered += 1;
            true
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(subscriber = %id, "subscriber outbox full; dropping subscriber");
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(subscriber = %id, "subscriber gone; dropping subscriber");
            false
        }
    });
    delivered
}
