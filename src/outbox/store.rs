//! In-memory outbox of pending messages.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message waiting to be handed to the delivery provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub recipient: String,
    pub body: String,
    /// Failed delivery attempts so far.
    pub attempts: u32,
}

impl OutboxMessage {
    pub fn new(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: recipient.into(),
            body: body.into(),
            attempts: 0,
        }
    }
}

/// A thread-safe FIFO of pending messages.
#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    pending: Mutex<VecDeque<OutboxMessage>>,
    sent: AtomicUsize,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// An outbox pre-filled with `count` generated messages.
    pub fn seeded(channel: &str, count: usize) -> Self {
        let outbox = Self::new();
        for i in 0..count {
            outbox.enqueue(OutboxMessage::new(
                format!("{channel}-recipient-{i}"),
                format!("{channel} notification #{i}"),
            ));
        }
        outbox
    }

    pub fn enqueue(&self, message: OutboxMessage) {
        self.lock().push_back(message);
    }

    /// Take up to `max` messages from the front.
    pub fn lease(&self, max: usize) -> Vec<OutboxMessage> {
        let mut pending = self.lock();
        let take = max.min(pending.len());
        pending.drain(..take).collect()
    }

    /// Put undelivered messages back at the front, keeping their order.
    pub fn requeue(&self, messages: Vec<OutboxMessage>) {
        let mut pending = self.lock();
        for message in messages.into_iter().rev() {
            pending.push_front(message);
        }
    }

    pub fn mark_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<OutboxMessage>> {
        self.pending.lock().expect("outbox mutex poisoned")
    }
}
