//! Outbound message dispatch.
//!
//! The unit of work the bundled binary schedules: drain an outbox of pending
//! notifications through a delivery provider.
//!
//! # Data Flow
//! ```text
//! Worker iteration
//!     → dispatcher.rs open_scope (empty lease)
//!     → lease batch from store.rs
//!     → provider.rs deliver, message by message
//!     → scope drop returns anything undelivered
//! ```

pub mod dispatcher;
pub mod provider;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

pub use dispatcher::{DispatchScope, OutboxDispatchJob};
pub use provider::SimulatedProvider;
pub use store::{InMemoryOutbox, OutboxMessage};

/// Errors raised while dispatching outbox messages.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The provider refused or failed to deliver a message.
    #[error("delivery of message {id} failed: {reason}")]
    Delivery { id: Uuid, reason: String },
}
