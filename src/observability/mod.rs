//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor, router, forwarder, worker runtime
//!     → logging.rs (structured tracing events, one subscriber per process)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (workers inherit the primary's stdout/stderr)
//!     → Prometheus scrape endpoint (primary only, optional)
//! ```
//!
//! # Design Decisions
//! - Every event carries the worker index and/or port it concerns
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
