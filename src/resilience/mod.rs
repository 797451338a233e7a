//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Worker iteration:
//!     → circuit_breaker.rs (admit, run, record outcome)
//!     → Success / Rejected / Failed back to the loop
//! ```
//!
//! # Design Decisions
//! - The breaker never swallows the protected call's error
//! - Rejection carries no error at all; it only steers the loop's backoff
//! - Fixed delays only: there is no retry or exponential backoff layer

pub mod circuit_breaker;

pub use circuit_breaker::{BreakerError, BreakerOutcome, CircuitBreaker, CircuitBreakerSettings, CircuitState};
