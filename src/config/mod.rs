//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WorkerServiceConfig (validated, immutable)
//!     → one WorkerConfig handed to each worker at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any validation error is fatal before a worker loop starts

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::WorkerServiceConfig;
pub use schema::WorkerConfig;
pub use schema::CircuitBreakerConfig;
pub use schema::OutboxConfig;
