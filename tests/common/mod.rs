//! Shared utilities for worker and breaker integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use outbox_worker::resilience::{CircuitBreaker, CircuitBreakerSettings};
use outbox_worker::scheduler::{Job, Worker, WorkerSettings};

/// What the scripted job does on one iteration.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Succeed, reporting this many items.
    Items(usize),
    /// Fail inside the unit of work.
    Fail,
    /// Fail to open the iteration scope.
    ScopeError,
    /// Never finish.
    Hang,
}

#[derive(Debug)]
pub struct ScriptedError(pub &'static str);

impl fmt::Display for ScriptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scripted failure: {}", self.0)
    }
}

impl std::error::Error for ScriptedError {}

/// Observations shared between a test and the job it handed to a worker.
#[derive(Default)]
pub struct Probe {
    calls: Mutex<Vec<Instant>>,
    opened: AtomicUsize,
    released: AtomicUsize,
    max_open: AtomicUsize,
    notify: Notify,
}

impl Probe {
    /// Instants at which `run` was entered.
    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Most scopes ever open at the same time.
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            self.notify.notified().await;
        }
    }

    /// Gaps between consecutive `run` calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls().windows(2).map(|w| w[1] - w[0]).collect()
    }
}

pub struct ScriptedScope {
    probe: Arc<Probe>,
}

impl Drop for ScriptedScope {
    fn drop(&mut self) {
        self.probe.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// A job that replays a fixed script, then reports no work forever.
pub struct ScriptedJob {
    script: Mutex<VecDeque<Step>>,
    probe: Arc<Probe>,
}

impl ScriptedJob {
    pub fn new(steps: Vec<Step>) -> (Self, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        let job = Self {
            script: Mutex::new(steps.into()),
            probe: probe.clone(),
        };
        (job, probe)
    }

    fn next_step(&self) -> Step {
        self.script.lock().unwrap().pop_front().unwrap_or(Step::Items(0))
    }
}

impl Job for ScriptedJob {
    type Scope = ScriptedScope;
    type Error = ScriptedError;

    fn open_scope(&self) -> Result<ScriptedScope, ScriptedError> {
        {
            let mut script = self.script.lock().unwrap();
            if let Some(Step::ScopeError) = script.front() {
                script.pop_front();
                return Err(ScriptedError("scope"));
            }
        }

        let open = self.probe.opened.fetch_add(1, Ordering::SeqCst) + 1
            - self.probe.released.load(Ordering::SeqCst);
        self.probe.max_open.fetch_max(open, Ordering::SeqCst);
        Ok(ScriptedScope {
            probe: self.probe.clone(),
        })
    }

    async fn run(&self, _scope: &mut ScriptedScope) -> Result<usize, ScriptedError> {
        let step = self.next_step();
        self.probe.calls.lock().unwrap().push(Instant::now());
        self.probe.notify.notify_one();

        match step {
            Step::Items(n) => Ok(n),
            Step::Fail => Err(ScriptedError("work")),
            Step::ScopeError => Err(ScriptedError("scope step reached run")),
            Step::Hang => {
                std::future::pending::<()>().await;
                Ok(0)
            }
        }
    }
}

/// Build a worker around a scripted job with explicit timings.
pub fn scripted_worker(
    name: &str,
    steps: Vec<Step>,
    failure_threshold: u32,
    open_duration: Duration,
    idle_delay: Duration,
    breaker_open_delay: Duration,
) -> (Worker<ScriptedJob>, Arc<Probe>) {
    let (job, probe) = ScriptedJob::new(steps);
    let breaker_settings = CircuitBreakerSettings::new(failure_threshold, open_duration).unwrap();
    let settings = WorkerSettings::new(idle_delay, breaker_open_delay).unwrap();
    let breaker = Arc::new(CircuitBreaker::new(name, breaker_settings));
    (Worker::new(name, job, settings, breaker), probe)
}
