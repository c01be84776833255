//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports fit in u16)
//! - Check that the whole contiguous port block is addressable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClusterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::ClusterConfig;
use crate::config::RestartPolicy;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.base_port must be non-zero")]
    ZeroBasePort,

    #[error("port range {base_port}..={last} does not fit in 1..=65535 for {workers} workers")]
    PortRangeOverflow { base_port: u16, workers: usize, last: usize },

    #[error("listener.host `{0}` is not a valid IP address")]
    InvalidHost(String),

    #[error("workers.upstream_host must not be empty")]
    EmptyUpstreamHost,

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("workers.program must not be empty")]
    EmptyProgram,

    #[error("workers.restart.base_delay_ms ({base}) exceeds max_delay_ms ({max})")]
    BackoffRange { base: u64, max: u64 },

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ClusterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base_port = config.listener.base_port;
    let workers = config.worker_count();
    if base_port == 0 {
        errors.push(ValidationError::ZeroBasePort);
    }
    let last = base_port as usize + workers;
    if last > u16::MAX as usize {
        errors.push(ValidationError::PortRangeOverflow { base_port, workers, last });
    }

    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidHost(config.listener.host.clone()));
    }
    if config.workers.upstream_host.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamHost);
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.upstream_secs"));
    }
    if config.workers.startup_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("workers.startup_timeout_secs"));
    }
    if config.workers.ready_probe_interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration("workers.ready_probe_interval_ms"));
    }

    if let Some(program) = &config.workers.program {
        if program.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyProgram);
        }
    }

    let restart = &config.workers.restart;
    if restart.policy == RestartPolicy::OnFailure && restart.base_delay_ms > restart.max_delay_ms {
        errors.push(ValidationError::BackoffRange {
            base: restart.base_delay_ms,
            max: restart.max_delay_ms,
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
