//! The event bus: a bounded, non-blocking channel from the graph core to
//! the subscription dispatcher (§4.5).
//!
//! Enqueue never blocks a writer: a full buffer drops the event and logs
//! it, tracked by [`EventBus::dropped_count`] so the property in §8
//! invariant 8 ("every successful mutation either enqueues exactly one
//! event or the event was dropped … observable via a counter") is
//! checkable in tests.

use crate::model::Event;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Clone)]
pub struct EventBus {
    sender: mpsc::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

pub struct EventReceiver {
    pub(crate) receiver: mpsc::Receiver<Event>,
}

impl EventBus {
    /// Creates a bounded channel of the given capacity (§4.5: 1000 by
    /// default, see [`crate::config::Config::event_bus_capacity`]).
    pub fn new(capacity: usize) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            EventReceiver { receiver },
        )
    }

    /// Non-blocking enqueue. On a full buffer the event is dropped and
    /// logged; writer latency is never paid (§4.5, §7 propagation policy).
    pub fn publish(&self, event: Event) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(event_type = event.event_type.as_str(), "event bus full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("event bus closed, dropping event");
            }
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}
