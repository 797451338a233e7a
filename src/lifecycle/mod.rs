//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every ShutdownSignal observes the request
//!     → worker loops finish their current iteration → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Cancellation is cooperative; an in-flight unit of work is never interrupted
//! - Late subscribers still observe an earlier trigger
//! - Shutdown has timeout: stragglers are aborted after the grace period

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
