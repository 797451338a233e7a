//! Outbox dispatch as a scheduler job.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::outbox::provider::SimulatedProvider;
use crate::outbox::store::{InMemoryOutbox, OutboxMessage};
use crate::outbox::DispatchError;
use crate::scheduler::Job;

/// Messages leased for one iteration.
///
/// Whatever is still leased when the scope drops goes back to the front of
/// the outbox, so a failed or abandoned iteration never loses messages.
#[derive(Debug)]
pub struct DispatchScope {
    outbox: Arc<InMemoryOutbox>,
    leased: VecDeque<OutboxMessage>,
}

impl DispatchScope {
    fn new(outbox: Arc<InMemoryOutbox>) -> Self {
        Self {
            outbox,
            leased: VecDeque::new(),
        }
    }

    pub fn leased(&self) -> usize {
        self.leased.len()
    }
}

impl Drop for DispatchScope {
    fn drop(&mut self) {
        if self.leased.is_empty() {
            return;
        }
        let returned: Vec<_> = self.leased.drain(..).collect();
        tracing::debug!(count = returned.len(), "Returning undelivered messages to outbox");
        self.outbox.requeue(returned);
    }
}

/// Sends pending outbox messages through the provider, one batch per iteration.
pub struct OutboxDispatchJob {
    outbox: Arc<InMemoryOutbox>,
    provider: SimulatedProvider,
    batch_size: usize,
}

impl OutboxDispatchJob {
    pub fn new(outbox: Arc<InMemoryOutbox>, provider: SimulatedProvider, batch_size: usize) -> Self {
        Self {
            outbox,
            provider,
            batch_size: batch_size.max(1),
        }
    }

    pub fn outbox(&self) -> &Arc<InMemoryOutbox> {
        &self.outbox
    }
}

impl Job for OutboxDispatchJob {
    type Scope = DispatchScope;
    type Error = DispatchError;

    fn open_scope(&self) -> Result<DispatchScope, DispatchError> {
        Ok(DispatchScope::new(self.outbox.clone()))
    }

    /// Deliver leased messages in order; stop at the first provider failure.
    async fn run(&self, scope: &mut DispatchScope) -> Result<usize, DispatchError> {
        scope.leased.extend(self.outbox.lease(self.batch_size));

        let mut sent = 0;
        while let Some(message) = scope.leased.front() {
            match self.provider.deliver(message).await {
                Ok(()) => {
                    scope.leased.pop_front();
                    self.outbox.mark_sent();
                    sent += 1;
                }
                Err(e) => {
                    if let Some(failed) = scope.leased.front_mut() {
                        failed.attempts += 1;
                    }
                    return Err(e);
                }
            }
        }

        Ok(sent)
    }
}
