//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (PORT, WORKERS)
//!     → CLI overrides (applied by main)
//!     → validation.rs (semantic checks)
//!     → ClusterConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the worker pool is fixed at startup
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks
//! - Workers never read this file: each one gets its port through its own
//!   environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ClusterConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RestartConfig;
pub use schema::RestartPolicy;
pub use schema::TimeoutConfig;
pub use schema::WorkersConfig;
