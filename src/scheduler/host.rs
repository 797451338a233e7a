//! Starting and stopping worker loops.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::lifecycle::Shutdown;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::scheduler::job::Job;
use crate::scheduler::worker::Worker;

impl<J: Job> Worker<J> {
    /// Spawn the loop on the current runtime with its own shutdown coordinator.
    pub fn start(self) -> WorkerHandle {
        let shutdown = Shutdown::new();
        let name = self.name().to_string();
        let breaker = self.breaker().clone();
        let task = tokio::spawn(self.run(shutdown.subscribe()));

        WorkerHandle {
            name,
            breaker,
            shutdown,
            task,
        }
    }
}

/// Handle to a single running worker.
///
/// Dropping the handle requests shutdown of the loop.
pub struct WorkerHandle {
    name: String,
    breaker: Arc<CircuitBreaker>,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Ask the loop to stop after its current iteration.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit.
    pub async fn join(self) -> Result<(), JoinError> {
        let WorkerHandle { task, shutdown, .. } = self;
        let result = task.await;
        drop(shutdown);
        result
    }
}

/// What happened to each worker during [`WorkerHost::shutdown`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Exited on their own within the grace period.
    pub stopped: Vec<String>,
    /// Still running at the deadline and aborted.
    pub aborted: Vec<String>,
    /// Panicked at some point before shutdown completed.
    pub panicked: Vec<String>,
}

struct HostedWorker {
    name: String,
    breaker: Arc<CircuitBreaker>,
    task: JoinHandle<()>,
}

/// Runs several independent workers under one shutdown signal.
pub struct WorkerHost {
    shutdown: Shutdown,
    workers: Vec<HostedWorker>,
}

impl WorkerHost {
    pub fn new() -> Self {
        Self {
            shutdown: Shutdown::new(),
            workers: Vec::new(),
        }
    }

    /// Start a worker on the current runtime.
    pub fn spawn<J: Job>(&mut self, worker: Worker<J>) {
        let name = worker.name().to_string();
        let breaker = worker.breaker().clone();
        let task = tokio::spawn(worker.run(self.shutdown.subscribe()));

        tracing::debug!(worker = %name, "Worker spawned");
        self.workers.push(HostedWorker {
            name,
            breaker,
            task,
        });
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Breaker of the named worker.
    pub fn breaker(&self, name: &str) -> Option<&Arc<CircuitBreaker>> {
        self.workers
            .iter()
            .find(|w| w.name == name)
            .map(|w| &w.breaker)
    }

    /// Signal every worker, then wait up to `grace` for them to exit.
    ///
    /// Workers still running at the deadline are aborted.
    pub async fn shutdown(self, grace: Duration) -> ShutdownReport {
        self.shutdown.trigger();
        tracing::info!(
            workers = self.workers.len(),
            grace_ms = grace.as_millis() as u64,
            "Waiting for workers to stop"
        );

        let deadline = Instant::now() + grace;
        let mut report = ShutdownReport::default();

        for HostedWorker { name, breaker, mut task } in self.workers {
            match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => report.stopped.push(name),
                Ok(Err(e)) => {
                    tracing::error!(worker = %name, error = %e, "Worker task failed");
                    report.panicked.push(name);
                }
                Err(_) => {
                    tracing::warn!(
                        worker = %name,
                        breaker_state = ?breaker.state(),
                        "Worker did not stop within grace period, aborting"
                    );
                    task.abort();
                    // Wait for the cancelled task so its iteration scope is dropped.
                    let _ = task.await;
                    report.aborted.push(name);
                }
            }
        }

        report
    }
}

impl Default for WorkerHost {
    fn default() -> Self {
        Self::new()
    }
}
