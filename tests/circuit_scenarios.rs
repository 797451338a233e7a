//! End-to-end circuit breaker scenarios through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinSet;

use outbox_worker::resilience::{BreakerError, BreakerOutcome, CircuitBreaker, CircuitBreakerSettings, CircuitState};

mod common;
use common::ScriptedError;

fn breaker(threshold: u32, open: Duration) -> Arc<CircuitBreaker> {
    let settings = CircuitBreakerSettings::new(threshold, open).unwrap();
    Arc::new(CircuitBreaker::new("provider", settings))
}

async fn failing_call(cb: &CircuitBreaker) -> BreakerOutcome<usize, ScriptedError> {
    cb.execute(|| async { Err(ScriptedError("provider down")) }).await
}

#[tokio::test(start_paused = true)]
async fn test_three_failures_then_rejection() {
    let cb = breaker(3, Duration::from_secs(10));

    for _ in 0..3 {
        assert!(matches!(failing_call(&cb).await, BreakerOutcome::Failed(_)));
    }
    assert_eq!(cb.state(), CircuitState::Open);

    // The fourth call is refused by the breaker, not failed by the dependency.
    match failing_call(&cb).await.into_result() {
        Err(BreakerError::Open) => {}
        Err(BreakerError::Operation(e)) => panic!("operation ran while open: {e}"),
        Ok(_) => panic!("operation ran while open"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_open_duration() {
    let cb = breaker(3, Duration::from_secs(10));
    for _ in 0..3 {
        failing_call(&cb).await;
    }

    tokio::time::advance(Duration::from_secs(10)).await;
    let outcome: BreakerOutcome<usize, ScriptedError> = cb.execute(|| async { Ok(4) }).await;

    assert!(matches!(outcome, BreakerOutcome::Success(4)));
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.failure_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failure_error_identity_is_preserved() {
    let cb = breaker(5, Duration::from_secs(10));
    match failing_call(&cb).await.into_result() {
        Err(BreakerError::Operation(ScriptedError(reason))) => assert_eq!(reason, "provider down"),
        _ => panic!("expected the operation's own error"),
    }
    assert_eq!(cb.failure_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_probe_storm_admits_one_caller() {
    let cb = breaker(1, Duration::from_secs(10));
    failing_call(&cb).await;
    tokio::time::advance(Duration::from_secs(10)).await;

    let invoked = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());
    let mut callers = JoinSet::new();

    for _ in 0..10 {
        let cb = cb.clone();
        let invoked = invoked.clone();
        let release = release.clone();
        callers.spawn(async move {
            cb.execute(|| async move {
                invoked.fetch_add(1, Ordering::SeqCst);
                release.notified().await;
                Ok::<_, ScriptedError>(1usize)
            })
            .await
        });
    }

    // Let every caller reach the breaker before the probe resolves.
    while invoked.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    release.notify_one();

    let mut admitted = 0;
    let mut rejected = 0;
    while let Some(outcome) = callers.join_next().await {
        match outcome.unwrap() {
            BreakerOutcome::Success(_) => admitted += 1,
            BreakerOutcome::Rejected => rejected += 1,
            BreakerOutcome::Failed(e) => panic!("unexpected failure: {e}"),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(rejected, 9);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    assert_eq!(cb.state(), CircuitState::Closed);
}
