//! Outbox worker (v1)
//!
//! Runs one circuit-breaker-gated polling loop per configured worker, each
//! draining its own outbox through a delivery provider.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────── outbox-worker ────────────────────────────┐
//!   │                                                                       │
//!   │   config ──▶ WorkerHost ──┬──▶ Worker "send-sms" ───┐                 │
//!   │                           │     loop: scope → breaker → job → delay   │
//!   │                           │                         ▼                 │
//!   │                           │              CircuitBreaker ──▶ provider  │
//!   │                           │                                           │
//!   │                           └──▶ Worker "send-email" (same shape)       │
//!   │                                                                       │
//!   │   signals ──▶ Shutdown ──▶ every loop stops at its next boundary      │
//!   │   observability: tracing logs, optional Prometheus endpoint           │
//!   └───────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;

use outbox_worker::config::loader::load_config;
use outbox_worker::config::validation::{validate_config, ValidationError};
use outbox_worker::config::WorkerServiceConfig;
use outbox_worker::lifecycle::signals::wait_for_shutdown_signal;
use outbox_worker::observability::{logging, metrics};
use outbox_worker::outbox::{InMemoryOutbox, OutboxDispatchJob, SimulatedProvider};
use outbox_worker::scheduler::{Worker, WorkerHost};

#[derive(Parser)]
#[command(name = "outbox-worker")]
#[command(about = "Circuit-breaker-gated background dispatch workers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults apply when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let config = WorkerServiceConfig::default();
            validate_config(&config).map_err(describe)?;
            config
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(config.observability.log_level.as_str());
    logging::init_logging(level)?;

    tracing::info!("outbox-worker v0.1.0 starting");
    tracing::info!(
        config = ?cli.config,
        workers = config.workers.len(),
        shutdown_timeout_ms = config.lifecycle.shutdown_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let mut host = WorkerHost::new();
    for worker_config in config.workers.iter().filter(|w| w.enabled) {
        let outbox = Arc::new(InMemoryOutbox::seeded(
            &worker_config.name,
            worker_config.outbox.seed_messages,
        ));
        let provider = SimulatedProvider::new(worker_config.outbox.failure_rate);
        let job = OutboxDispatchJob::new(outbox, provider, worker_config.outbox.batch_size);

        host.spawn(Worker::from_config(job, worker_config)?);
    }

    if host.is_empty() {
        tracing::warn!("No enabled workers configured");
    }

    wait_for_shutdown_signal().await;

    let report = host.shutdown(config.lifecycle.shutdown_timeout()).await;
    tracing::info!(
        stopped = report.stopped.len(),
        aborted = report.aborted.len(),
        panicked = report.panicked.len(),
        "Shutdown complete"
    );
    Ok(())
}

fn describe(errors: Vec<ValidationError>) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
