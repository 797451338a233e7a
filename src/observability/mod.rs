//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Worker loops and circuit breakers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every event carries the worker or breaker name as a field
//! - Breaker rejections are expected: debug logs and a counter, never errors
//! - Metrics are cheap when no recorder is installed

pub mod logging;
pub mod metrics;
