//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, delays > 0, rates within 0..=1)
//! - Detect duplicate or empty worker names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WorkerServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before any worker loop is started

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{WorkerConfig, WorkerServiceConfig};
use crate::resilience::circuit_breaker::CircuitBreakerSettings;
use crate::scheduler::worker::WorkerSettings;

/// A single out-of-range setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingError {
    #[error("failure threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("outbox batch size must be at least 1")]
    ZeroBatchSize,

    #[error("outbox failure rate must be between 0.0 and 1.0")]
    FailureRateOutOfRange,
}

/// A semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("worker name must not be empty")]
    EmptyWorkerName,

    #[error("worker name `{0}` is configured more than once")]
    DuplicateWorkerName(String),

    #[error("worker `{worker}`: {source}")]
    InvalidWorker { worker: String, source: SettingError },

    #[error("metrics address `{0}` is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate the whole configuration, collecting every error.
pub fn validate_config(config: &WorkerServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for worker in &config.workers {
        if worker.name.trim().is_empty() {
            errors.push(ValidationError::EmptyWorkerName);
        } else if !seen.insert(worker.name.as_str()) {
            errors.push(ValidationError::DuplicateWorkerName(worker.name.clone()));
        }

        errors.extend(
            validate_worker(worker)
                .into_iter()
                .map(|source| ValidationError::InvalidWorker {
                    worker: worker.name.clone(),
                    source,
                }),
        );
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Range checks for one worker, reusing the constructors the loop itself relies on.
fn validate_worker(worker: &WorkerConfig) -> Vec<SettingError> {
    let mut errors = Vec::new();

    if let Err(e) = CircuitBreakerSettings::new(
        worker.circuit_breaker.failure_threshold,
        worker.circuit_breaker.open_duration(),
    ) {
        errors.push(e);
    }
    if let Err(e) = WorkerSettings::new(worker.idle_delay(), worker.breaker_open_delay()) {
        errors.push(e);
    }

    let outbox = &worker.outbox;
    if outbox.batch_size == 0 {
        errors.push(SettingError::ZeroBatchSize);
    }
    if !(0.0..=1.0).contains(&outbox.failure_rate) {
        errors.push(SettingError::FailureRateOutOfRange);
    }

    errors
}
