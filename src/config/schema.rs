//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the cluster.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default listening port for the load balancer.
pub const DEFAULT_BASE_PORT: u16 = 4000;

/// Root configuration for the worker cluster.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClusterConfig {
    /// Front listener configuration (bind host, base port).
    pub listener: ListenerConfig,

    /// Worker pool settings.
    pub workers: WorkersConfig,

    /// Timeout configuration for proxied requests.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ClusterConfig {
    /// Number of workers to spawn.
    ///
    /// An explicit count wins; otherwise available parallelism minus one,
    /// never less than one.
    pub fn worker_count(&self) -> usize {
        match self.workers.count {
            Some(count) => count.max(1),
            None => default_worker_count(),
        }
    }

    /// Port assigned to the worker at `index`.
    pub fn worker_port(&self, index: usize) -> u16 {
        worker_port(self.listener.base_port, index)
    }
}

/// Port for worker `index` given the router's `base_port`.
///
/// Workers occupy `base_port + 1 ..= base_port + N`.
///
/// # Panics
///
/// Panics if the port does not fit in `u16`. `validate_config` rejects
/// such configurations; use [`checked_worker_port`] for unvalidated input.
pub fn worker_port(base_port: u16, index: usize) -> u16 {
    match checked_worker_port(base_port, index) {
        Some(port) => port,
        None => panic!("worker {index} has no port above base port {base_port}"),
    }
}

/// Port for worker `index`, or `None` when it would exceed `u16::MAX`.
pub fn checked_worker_port(base_port: u16, index: usize) -> Option<u16> {
    u16::try_from(index)
        .ok()
        .and_then(|index| base_port.checked_add(index))
        .and_then(|port| port.checked_add(1))
}

/// Detected parallelism minus one, minimum one.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface the load balancer binds to.
    pub host: String,

    /// Load balancer port. Workers take the following ports.
    pub base_port: u16,

    /// Maximum concurrent client connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            base_port: DEFAULT_BASE_PORT,
            max_connections: 10_000,
        }
    }
}

impl ListenerConfig {
    /// `host:base_port`, suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.base_port)
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Fixed worker count. `None` means parallelism minus one.
    pub count: Option<usize>,

    /// Program to launch for each worker. `None` re-executes this binary.
    pub program: Option<PathBuf>,

    /// Arguments passed to the worker program.
    pub args: Vec<String>,

    /// Host the workers listen on and the forwarder connects to.
    pub upstream_host: String,

    /// How long a worker may take to start accepting connections.
    pub startup_timeout_secs: u64,

    /// Interval between readiness probes while a worker is starting.
    pub ready_probe_interval_ms: u64,

    /// Restart behavior for exited workers.
    pub restart: RestartConfig,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: None,
            program: None,
            args: vec!["worker".to_string()],
            upstream_host: "127.0.0.1".to_string(),
            startup_timeout_secs: 10,
            ready_probe_interval_ms: 50,
            restart: RestartConfig::default(),
        }
    }
}

/// What the supervisor does when a worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Exited workers stay dead; their slot keeps receiving traffic.
    #[default]
    Never,
    /// Relaunch workers that exit with a failure or fail to spawn.
    OnFailure,
}

/// Restart configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestartConfig {
    pub policy: RestartPolicy,

    /// Maximum restarts per worker before giving up.
    pub max_restarts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            policy: RestartPolicy::Never,
            max_restarts: 5,
            base_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

/// Timeout configuration for proxied requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for a worker to produce its response head, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
