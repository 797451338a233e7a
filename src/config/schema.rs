//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the worker service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the worker service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerServiceConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Startup/shutdown settings.
    pub lifecycle: LifecycleConfig,

    /// Background workers, one loop each.
    pub workers: Vec<WorkerConfig>,
}

impl Default for WorkerServiceConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig::default(),
            lifecycle: LifecycleConfig::default(),
            workers: vec![
                WorkerConfig::named("send-sms"),
                WorkerConfig::named("send-email"),
            ],
        }
    }
}

/// A single background worker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker identifier for logging/metrics.
    pub name: String,

    /// Disabled workers are validated but never started.
    pub enabled: bool,

    /// Wait after an iteration that found no work, in milliseconds.
    pub idle_delay_ms: u64,

    /// Wait after the circuit breaker rejected an iteration, in milliseconds.
    pub breaker_open_delay_ms: u64,

    /// Circuit breaker guarding the worker's dependency.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Demo outbox backing this worker.
    pub outbox: OutboxConfig,
}

impl WorkerConfig {
    /// Default settings under the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn breaker_open_delay(&self) -> Duration {
        Duration::from_millis(self.breaker_open_delay_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "worker".to_string(),
            enabled: true,
            idle_delay_ms: 10_000,
            breaker_open_delay_ms: 10_000,
            circuit_breaker: CircuitBreakerConfig::default(),
            outbox: OutboxConfig::default(),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// How long the circuit stays open before a probe, in milliseconds.
    pub open_duration_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn open_duration(&self) -> Duration {
        Duration::from_millis(self.open_duration_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration_ms: 30_000,
        }
    }
}

/// Settings for the in-memory outbox used by the bundled dispatch job.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutboxConfig {
    /// Messages enqueued at startup.
    pub seed_messages: usize,

    /// Maximum messages leased per iteration.
    pub batch_size: usize,

    /// Probability (0.0..=1.0) that the simulated provider rejects a delivery.
    pub failure_rate: f64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            seed_messages: 25,
            batch_size: 10,
            failure_rate: 0.1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Grace period for workers to finish their current iteration, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl LifecycleConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_ms: 30_000,
        }
    }
}
