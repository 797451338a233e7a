//! Background job scheduling.
//!
//! # Data Flow
//! ```text
//! WorkerHost / Worker::start
//!     → worker.rs loop (one per job, strictly sequential)
//!         → job.rs open_scope()           (fresh context per iteration)
//!         → CircuitBreaker::execute(run)  (resilience/circuit_breaker.rs)
//!         → outcome → delay (idle / breaker-open / none)
//!         → scope dropped
//!     ← Shutdown trigger ends the loop at the next boundary
//! ```
//!
//! # Design Decisions
//! - One loop and one breaker per worker; breakers are never shared
//! - Only the two delays suspend the loop, and both are cancellable
//! - Failures never stop a loop; only shutdown does

pub mod host;
pub mod job;
pub mod worker;

pub use host::{ShutdownReport, WorkerHandle, WorkerHost};
pub use job::Job;
pub use worker::{IterationOutcome, Worker, WorkerSettings};
