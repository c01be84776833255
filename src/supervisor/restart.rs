//! Restart decisions and exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::{RestartConfig, RestartPolicy};

/// Decide whether a worker that just went down should be relaunched.
///
/// `succeeded` is true when the process exited with status 0. Spawn
/// failures and signal deaths count as failures.
pub fn should_restart(config: &RestartConfig, restarts_so_far: u32, succeeded: bool) -> bool {
    match config.policy {
        RestartPolicy::Never => false,
        RestartPolicy::OnFailure => !succeeded && restarts_so_far < config.max_restarts,
    }
}

/// Delay before relaunch number `restart` (1-based) of a worker.
///
/// Doubles from `base_delay_ms` per restart, capped at `max_delay_ms`, plus
/// up to 10% random spread so workers that crashed together come back
/// staggered.
pub fn restart_delay(config: &RestartConfig, restart: u32) -> Duration {
    let doublings = restart.saturating_sub(1).min(63);
    let delay_ms = config
        .base_delay_ms
        .saturating_mul(1u64 << doublings)
        .min(config.max_delay_ms);

    let spread = match delay_ms / 10 {
        0 => 0,
        range => rand::thread_rng().gen_range(0..range),
    };
    Duration::from_millis(delay_ms + spread)
}
