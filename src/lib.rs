//! Resilient background job worker library

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod outbox;
pub mod resilience;
pub mod scheduler;

pub use config::schema::WorkerServiceConfig;
pub use lifecycle::Shutdown;
pub use resilience::circuit_breaker::{BreakerOutcome, CircuitBreaker, CircuitState};
pub use scheduler::{Job, Worker, WorkerHost};
