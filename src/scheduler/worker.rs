//! Circuit-breaker-gated polling loop.
//!
//! # Responsibilities
//! - Run the unit of work once per iteration inside a fresh scope
//! - Route every call through the worker's circuit breaker
//! - Pick the wait before the next iteration from the outcome
//! - Stop at the next iteration boundary once shutdown is requested
//!
//! # Backoff
//! ```text
//! Processed(n > 0)  → next iteration immediately (drain backlog)
//! Idle              → idle_delay
//! Rejected          → breaker_open_delay
//! Failed            → immediately; the breaker decides when to stop calling
//! ScopeUnavailable  → idle_delay
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::WorkerConfig;
use crate::config::validation::{SettingError, ValidationError};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{BreakerOutcome, CircuitBreaker, CircuitBreakerSettings};
use crate::scheduler::job::Job;

/// Validated loop delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    idle_delay: Duration,
    breaker_open_delay: Duration,
}

impl WorkerSettings {
    pub fn new(idle_delay: Duration, breaker_open_delay: Duration) -> Result<Self, SettingError> {
        if idle_delay.is_zero() {
            return Err(SettingError::ZeroDuration("idle delay"));
        }
        if breaker_open_delay.is_zero() {
            return Err(SettingError::ZeroDuration("breaker-open delay"));
        }
        Ok(Self {
            idle_delay,
            breaker_open_delay,
        })
    }

    pub fn idle_delay(&self) -> Duration {
        self.idle_delay
    }

    pub fn breaker_open_delay(&self) -> Duration {
        self.breaker_open_delay
    }
}

/// What a single iteration amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The unit of work handled this many items (always > 0).
    Processed(usize),
    /// The unit of work found nothing to do.
    Idle,
    /// The circuit breaker refused the call.
    Rejected,
    /// The unit of work failed; the breaker has recorded it.
    Failed,
    /// The iteration scope could not be opened; the unit of work did not run.
    ScopeUnavailable,
}

impl IterationOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            IterationOutcome::Processed(_) => "processed",
            IterationOutcome::Idle => "idle",
            IterationOutcome::Rejected => "rejected",
            IterationOutcome::Failed => "failed",
            IterationOutcome::ScopeUnavailable => "scope_unavailable",
        }
    }
}

/// A background worker: one job, one breaker, one sequential loop.
pub struct Worker<J: Job> {
    name: String,
    job: J,
    breaker: Arc<CircuitBreaker>,
    settings: WorkerSettings,
}

impl<J: Job> Worker<J> {
    pub fn new(name: impl Into<String>, job: J, settings: WorkerSettings, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            name: name.into(),
            job,
            breaker,
            settings,
        }
    }

    /// Build a worker and its dedicated breaker from configuration.
    pub fn from_config(job: J, config: &WorkerConfig) -> Result<Self, ValidationError> {
        let invalid = |source| ValidationError::InvalidWorker {
            worker: config.name.clone(),
            source,
        };

        let breaker_settings = CircuitBreakerSettings::new(
            config.circuit_breaker.failure_threshold,
            config.circuit_breaker.open_duration(),
        )
        .map_err(invalid)?;
        let settings = WorkerSettings::new(config.idle_delay(), config.breaker_open_delay())
            .map_err(invalid)?;

        let breaker = Arc::new(CircuitBreaker::new(config.name.clone(), breaker_settings));
        Ok(Self::new(config.name.clone(), job, settings, breaker))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Wait to apply after an iteration with the given outcome.
    pub fn delay_after(&self, outcome: IterationOutcome) -> Duration {
        match outcome {
            IterationOutcome::Processed(_) | IterationOutcome::Failed => Duration::ZERO,
            IterationOutcome::Idle | IterationOutcome::ScopeUnavailable => self.settings.idle_delay,
            IterationOutcome::Rejected => self.settings.breaker_open_delay,
        }
    }

    /// Run exactly one iteration. The scope is released before this returns.
    pub async fn run_once(&self) -> IterationOutcome {
        tracing::debug!(worker = %self.name, "Worker iteration starting");

        let outcome = match self.job.open_scope() {
            Ok(mut scope) => {
                let scope_ref = &mut scope;
                let result = self.breaker.execute(move || self.job.run(scope_ref)).await;
                drop(scope);
                self.classify(result)
            }
            Err(e) => {
                tracing::error!(worker = %self.name, error = %e, "Failed to open iteration scope");
                IterationOutcome::ScopeUnavailable
            }
        };

        metrics::record_iteration(&self.name, outcome.label());
        outcome
    }

    fn classify(&self, result: BreakerOutcome<usize, J::Error>) -> IterationOutcome {
        match result {
            BreakerOutcome::Success(0) => IterationOutcome::Idle,
            BreakerOutcome::Success(items) => {
                tracing::debug!(worker = %self.name, items, "Processed items");
                metrics::record_items_processed(&self.name, items);
                IterationOutcome::Processed(items)
            }
            BreakerOutcome::Rejected => {
                tracing::debug!(worker = %self.name, "Circuit breaker open, skipping iteration");
                IterationOutcome::Rejected
            }
            BreakerOutcome::Failed(e) => {
                tracing::warn!(
                    worker = %self.name,
                    error = %e,
                    failures = self.breaker.failure_count(),
                    state = ?self.breaker.state(),
                    "Unit of work failed"
                );
                IterationOutcome::Failed
            }
        }
    }

    /// Loop until shutdown is requested.
    ///
    /// Shutdown is checked before every iteration and interrupts any wait; an
    /// iteration already in progress always runs to completion.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            worker = %self.name,
            idle_delay_ms = self.settings.idle_delay.as_millis() as u64,
            breaker_open_delay_ms = self.settings.breaker_open_delay.as_millis() as u64,
            failure_threshold = self.breaker.settings().failure_threshold(),
            "Worker starting"
        );

        while !shutdown.is_requested() {
            let outcome = self.run_once().await;
            let delay = self.delay_after(outcome);

            if delay.is_zero() {
                // Drain the backlog, but let other tasks run between batches.
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.requested() => {
                    tracing::debug!(worker = %self.name, "Shutdown requested while waiting");
                    break;
                }
            }
        }

        tracing::info!(worker = %self.name, "Worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Never;

    impl fmt::Display for Never {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "never")
        }
    }

    impl std::error::Error for Never {}

    struct NoopJob;

    impl Job for NoopJob {
        type Scope = ();
        type Error = Never;

        fn open_scope(&self) -> Result<(), Never> {
            Ok(())
        }

        async fn run(&self, _scope: &mut ()) -> Result<usize, Never> {
            Ok(0)
        }
    }

    #[test]
    fn test_settings_reject_zero_delays() {
        assert_eq!(
            WorkerSettings::new(Duration::ZERO, Duration::from_secs(1)),
            Err(SettingError::ZeroDuration("idle delay"))
        );
        assert_eq!(
            WorkerSettings::new(Duration::from_secs(1), Duration::ZERO),
            Err(SettingError::ZeroDuration("breaker-open delay"))
        );
    }

    #[test]
    fn test_delay_policy() {
        let mut config = WorkerConfig::named("sms");
        config.idle_delay_ms = 1_000;
        config.breaker_open_delay_ms = 5_000;
        let worker = Worker::from_config(NoopJob, &config).unwrap();

        assert_eq!(worker.delay_after(IterationOutcome::Processed(5)), Duration::ZERO);
        assert_eq!(worker.delay_after(IterationOutcome::Failed), Duration::ZERO);
        assert_eq!(worker.delay_after(IterationOutcome::Idle), Duration::from_secs(1));
        assert_eq!(worker.delay_after(IterationOutcome::ScopeUnavailable), Duration::from_secs(1));
        assert_eq!(worker.delay_after(IterationOutcome::Rejected), Duration::from_secs(5));
    }

    #[test]
    fn test_from_config_rejects_invalid_breaker() {
        let mut config = WorkerConfig::named("sms");
        config.circuit_breaker.failure_threshold = 0;

        let err = Worker::from_config(NoopJob, &config).err().unwrap();
        assert_eq!(
            err,
            ValidationError::InvalidWorker {
                worker: "sms".into(),
                source: SettingError::ZeroFailureThreshold,
            }
        );
    }

    #[tokio::test]
    async fn test_idle_iteration() {
        let worker = Worker::from_config(NoopJob, &WorkerConfig::named("sms")).unwrap();
        assert_eq!(worker.run_once().await, IterationOutcome::Idle);
        assert_eq!(worker.breaker().name(), "sms");
    }
}
