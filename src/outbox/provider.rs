//! Simulated delivery provider.

use std::time::Duration;
use rand::Rng;

use crate::outbox::store::OutboxMessage;
use crate::outbox::DispatchError;

/// Stand-in for an SMS/email gateway that fails at a configurable rate.
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    failure_rate: f64,
    latency: Duration,
}

impl SimulatedProvider {
    /// `failure_rate` is clamped to 0.0..=1.0 (NaN counts as 0.0); 1.0 models a full outage.
    pub fn new(failure_rate: f64) -> Self {
        let failure_rate = if failure_rate.is_nan() { 0.0 } else { failure_rate.clamp(0.0, 1.0) };
        Self {
            failure_rate,
            latency: Duration::from_millis(5),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn deliver(&self, message: &OutboxMessage) -> Result<(), DispatchError> {
        let rejected = rand::thread_rng().gen_bool(self.failure_rate);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if rejected {
            return Err(DispatchError::Delivery {
                id: message.id,
                reason: "provider unavailable".to_string(),
            });
        }

        tracing::trace!(id = %message.id, recipient = %message.recipient, "Message delivered");
        Ok(())
    }
}
