//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls are rejected without running
//! - Half-Open: a single probe call tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures reach failure_threshold
//! Open → Half-Open: first call after open_duration has elapsed
//! Half-Open → Closed: probe call succeeds
//! Half-Open → Open: probe call fails (or is abandoned)
//! ```
//!
//! # Design Decisions
//! - One breaker per protected dependency (never shared across unrelated work)
//! - Rejection is an explicit outcome, not an error of the protected call
//! - Single probe in Half-Open (prevents a burst of probes re-opening the circuit)
//! - All state lives behind one mutex; the lock is never held across the call

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::validation::SettingError;
use crate::observability::metrics;

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Validated breaker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerSettings {
    failure_threshold: u32,
    open_duration: Duration,
}

impl CircuitBreakerSettings {
    /// Rejects a zero threshold or a zero open duration.
    pub fn new(failure_threshold: u32, open_duration: Duration) -> Result<Self, SettingError> {
        if failure_threshold == 0 {
            return Err(SettingError::ZeroFailureThreshold);
        }
        if open_duration.is_zero() {
            return Err(SettingError::ZeroDuration("open duration"));
        }
        Ok(Self {
            failure_threshold,
            open_duration,
        })
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn open_duration(&self) -> Duration {
        self.open_duration
    }
}

/// Result of a call made through the breaker.
#[derive(Debug, PartialEq, Eq)]
pub enum BreakerOutcome<T, E> {
    /// The operation ran and succeeded.
    Success(T),
    /// The breaker refused the call; the operation was not run.
    Rejected,
    /// The operation ran and failed with its own error.
    Failed(E),
}

impl<T, E> BreakerOutcome<T, E> {
    pub fn is_rejected(&self) -> bool {
        matches!(self, BreakerOutcome::Rejected)
    }

    /// Collapse into a `Result` for callers that want `?`.
    pub fn into_result(self) -> Result<T, BreakerError<E>> {
        match self {
            BreakerOutcome::Success(value) => Ok(value),
            BreakerOutcome::Rejected => Err(BreakerError::Open),
            BreakerOutcome::Failed(e) => Err(BreakerError::Operation(e)),
        }
    }
}

/// Error view of a non-successful [`BreakerOutcome`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    #[error("circuit breaker is open")]
    Open,

    #[error(transparent)]
    Operation(E),
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// A circuit breaker guarding one dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: CircuitBreakerSettings,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<String>, settings: CircuitBreakerSettings) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, CircuitState::Closed);
        Self {
            name,
            settings,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &CircuitBreakerSettings {
        &self.settings
    }

    /// Last recorded state. The Open → Half-Open move happens inside `execute`,
    /// so an expired Open circuit still reports `Open` here.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consecutive failures since the last success or reset.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Run `operation` if the circuit allows it.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> BreakerOutcome<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.admit() else {
            metrics::record_breaker_rejection(&self.name);
            return BreakerOutcome::Rejected;
        };

        match operation().await {
            Ok(value) => {
                permit.succeed();
                BreakerOutcome::Success(value)
            }
            Err(e) => {
                permit.fail();
                BreakerOutcome::Failed(e)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.inner.lock().expect("circuit breaker mutex poisoned")
    }

    /// Decide whether a call may run, moving Open → Half-Open when the wait is over.
    fn admit(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();
        let now = Instant::now();

        if inner.state == CircuitState::Open {
            let opened_at = inner.opened_at.unwrap_or(now);
            if now.duration_since(opened_at) < self.settings.open_duration {
                tracing::debug!(breaker = %self.name, "Circuit open, rejecting call");
                return None;
            }
            inner.state = CircuitState::HalfOpen;
            inner.failure_count = 0;
            tracing::info!(breaker = %self.name, "Circuit half-open, probing dependency");
            metrics::record_breaker_state(&self.name, CircuitState::HalfOpen);
        }

        match inner.state {
            CircuitState::Closed => Some(Permit::new(self, false)),
            CircuitState::HalfOpen if inner.trial_in_flight => {
                tracing::debug!(breaker = %self.name, "Probe already in flight, rejecting call");
                None
            }
            CircuitState::HalfOpen => {
                inner.trial_in_flight = true;
                Some(Permit::new(self, true))
            }
            CircuitState::Open => None,
        }
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.lock();
        if trial {
            inner.trial_in_flight = false;
            inner.state = CircuitState::Closed;
            inner.failure_count = 0;
            inner.opened_at = None;
            tracing::info!(breaker = %self.name, "Probe succeeded, circuit closed");
            metrics::record_breaker_state(&self.name, CircuitState::Closed);
        } else if inner.state == CircuitState::Closed {
            inner.failure_count = 0;
        }
    }

    fn on_failure(&self, trial: bool) {
        let mut inner = self.lock();
        if trial {
            inner.trial_in_flight = false;
            self.trip(&mut inner);
            return;
        }
        // A call admitted while Closed may finish after another caller opened
        // the circuit; its result no longer says anything about the probe window.
        if inner.state != CircuitState::Closed {
            return;
        }
        inner.failure_count += 1;
        if inner.failure_count >= self.settings.failure_threshold {
            self.trip(&mut inner);
        }
    }

    fn trip(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        tracing::warn!(
            breaker = %self.name,
            failures = inner.failure_count,
            open_for_ms = self.settings.open_duration.as_millis() as u64,
            "Circuit opened"
        );
        metrics::record_breaker_state(&self.name, CircuitState::Open);
    }
}

/// Admission ticket for one call. Dropping an unresolved probe re-opens the circuit.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    resolved: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            resolved: false,
        }
    }

    fn succeed(mut self) {
        self.resolved = true;
        self.breaker.on_success(self.trial);
    }

    fn fail(mut self) {
        self.resolved = true;
        self.breaker.on_failure(self.trial);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.resolved && self.trial {
            tracing::warn!(breaker = %self.breaker.name, "Probe abandoned before completing");
            self.breaker.on_failure(true);
        }
    }
}
