//! Worker supervision subsystem.
//!
//! # Data Flow
//! ```text
//! start(worker_count, base_port)
//!     → pool.rs (fixed slots, ports base_port+1..=base_port+N)
//!     → per slot: launcher.rs spawns the child with PORT in its env
//!     → per slot monitor task:
//!         readiness probe  → Starting → Running
//!         child exits      → on_exit → Exited (→ Restarting, if policy allows)
//!         spawn fails      → on_spawn_error → Exited
//!         stop / shutdown  → kill + reap → Exited
//! ```
//!
//! # Design Decisions
//! - One monitor task per slot owns the child handle; it is the only writer
//!   of that slot's state
//! - The router is never told about exits; dead slots keep their place in
//!   the rotation
//! - No restarts unless `workers.restart.policy = "on-failure"`
//! - Shutdown kills and reaps every child before `wait` returns

pub mod launcher;
pub mod pool;
pub mod restart;
pub mod worker;

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::net::TcpStream;
use tokio::process::Child;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{ClusterConfig, RestartConfig};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

pub use launcher::WorkerCommand;
pub use pool::WorkerPool;
pub use worker::{WorkerDescriptor, WorkerState};

/// Error type for supervisor setup.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to resolve the worker executable: {0}")]
    CurrentExe(#[source] std::io::Error),
}

/// Settings shared by every monitor task.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub command: WorkerCommand,
    pub upstream_host: String,
    pub restart: RestartConfig,
    pub startup_timeout: Duration,
    pub probe_interval: Duration,
}

impl SupervisorSettings {
    /// Derive settings from the cluster config.
    ///
    /// Without an explicit `workers.program` the running binary is reused.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, SupervisorError> {
        let args = config.workers.args.clone();
        let command = match &config.workers.program {
            Some(program) => WorkerCommand::new(program.clone(), args),
            None => WorkerCommand::current_exe(args).map_err(SupervisorError::CurrentExe)?,
        };

        Ok(Self {
            command,
            upstream_host: config.workers.upstream_host.clone(),
            restart: config.workers.restart.clone(),
            startup_timeout: Duration::from_secs(config.workers.startup_timeout_secs),
            probe_interval: Duration::from_millis(config.workers.ready_probe_interval_ms),
        })
    }
}

/// Launches and watches the worker processes.
#[derive(Debug)]
pub struct Supervisor {
    settings: Arc<SupervisorSettings>,
    tasks: Vec<JoinHandle<()>>,
}

enum Outcome {
    Exited(ExitStatus),
    WaitFailed(std::io::Error),
    Stopped,
}

impl Supervisor {
    pub fn new(settings: SupervisorSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            tasks: Vec::new(),
        }
    }

    /// Spawn `worker_count` workers for a router listening on `base_port`.
    ///
    /// Returns immediately; each slot starts in `Starting` and is driven by
    /// its own monitor task. Every task stops its child when `shutdown`
    /// fires.
    pub fn start(&mut self, worker_count: usize, base_port: u16, shutdown: &Shutdown) -> Arc<WorkerPool> {
        let pool = Arc::new(WorkerPool::new(base_port, worker_count));

        tracing::info!(
            workers = pool.len(),
            base_port,
            first_port = pool.port_of(0),
            last_port = pool.port_of(pool.len() - 1),
            "Starting worker pool"
        );

        for index in 0..pool.len() {
            let task = tokio::spawn(monitor_worker(
                self.settings.clone(),
                pool.clone(),
                index,
                shutdown.subscribe(),
            ));
            self.tasks.push(task);
        }

        pool
    }

    /// Wait for every monitor task to finish.
    ///
    /// Tasks finish when their worker is gone for good, which after a
    /// shutdown means every child has been killed and reaped.
    pub async fn wait(self) {
        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker monitor task failed");
            }
        }
    }

    /// Record a worker exit.
    pub fn on_exit(pool: &WorkerPool, index: usize, exit_code: Option<i32>) {
        let Some(worker) = pool.get(index) else {
            return;
        };
        worker.set_pid(None);
        worker.set_state(WorkerState::Exited);

        match exit_code {
            Some(code) => tracing::warn!(worker = index, port = worker.port(), code, "Worker exited"),
            None => tracing::warn!(worker = index, port = worker.port(), "Worker terminated by signal"),
        }
        metrics::record_worker_exit(index);
        metrics::set_worker_up(index, false);
    }

    /// Record a failure to launch a worker. The slot stays dead.
    pub fn on_spawn_error(pool: &WorkerPool, index: usize, error: &std::io::Error) {
        let Some(worker) = pool.get(index) else {
            return;
        };
        worker.set_pid(None);
        worker.set_state(WorkerState::Exited);

        tracing::error!(
            worker = index,
            port = worker.port(),
            error = %error,
            "Failed to start worker"
        );
        metrics::record_spawn_failure(index);
        metrics::set_worker_up(index, false);
    }
}

/// Own one worker slot for its whole life: spawn, probe, wait, restart.
async fn monitor_worker(
    settings: Arc<SupervisorSettings>,
    pool: Arc<WorkerPool>,
    index: usize,
    mut shutdown: broadcast::Receiver<()>,
) {
    let Some(worker) = pool.get(index) else {
        return;
    };
    let port = worker.port();

    loop {
        worker.set_state(WorkerState::Starting);

        let succeeded = match settings.command.spawn(index, port, &settings.upstream_host) {
            Err(e) => {
                Supervisor::on_spawn_error(&pool, index, &e);
                false
            }
            Ok(mut child) => {
                worker.set_pid(child.id());

                let ready = probe_ready(
                    &settings.upstream_host,
                    port,
                    settings.probe_interval,
                    settings.startup_timeout,
                );
                tokio::pin!(ready);
                let mut probing = true;

                let outcome = loop {
                    tokio::select! {
                        status = child.wait() => match status {
                            Ok(status) => break Outcome::Exited(status),
                            Err(e) => break Outcome::WaitFailed(e),
                        },
                        _ = worker.stop_requested() => break Outcome::Stopped,
                        _ = shutdown.recv() => break Outcome::Stopped,
                        is_ready = &mut ready, if probing => {
                            probing = false;
                            if is_ready {
                                worker.set_state(WorkerState::Running);
                                metrics::set_worker_up(index, true);
                                tracing::info!(worker = index, port, pid = ?worker.pid(), "Worker ready");
                            } else {
                                tracing::warn!(
                                    worker = index,
                                    port,
                                    timeout = ?settings.startup_timeout,
                                    "Worker did not start accepting connections in time"
                                );
                            }
                        }
                    }
                };

                match outcome {
                    Outcome::Exited(status) => {
                        Supervisor::on_exit(&pool, index, status.code());
                        status.success()
                    }
                    Outcome::WaitFailed(e) => {
                        tracing::error!(worker = index, port, error = %e, "Failed to wait on worker");
                        kill_worker(&mut child, index, port).await;
                        Supervisor::on_exit(&pool, index, None);
                        false
                    }
                    Outcome::Stopped => {
                        kill_worker(&mut child, index, port).await;
                        worker.set_pid(None);
                        worker.set_state(WorkerState::Exited);
                        metrics::set_worker_up(index, false);
                        tracing::info!(worker = index, port, "Worker stopped");
                        return;
                    }
                }
            }
        };

        let restarts = worker.restarts();
        if !restart::should_restart(&settings.restart, restarts, succeeded) {
            return;
        }

        let delay = restart::restart_delay(&settings.restart, restarts + 1);
        worker.set_state(WorkerState::Restarting);
        tracing::info!(worker = index, port, attempt = restarts + 1, delay = ?delay, "Restarting worker");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = worker.stop_requested() => {
                worker.set_state(WorkerState::Exited);
                return;
            }
            _ = shutdown.recv() => {
                worker.set_state(WorkerState::Exited);
                return;
            }
        }
        worker.record_restart();
    }
}

/// Kill and reap `child`. A failure is logged; returns whether the kill went through.
async fn kill_worker(child: &mut Child, index: usize, port: u16) -> bool {
    match child.kill().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(worker = index, port, error = %e, "Failed to kill worker");
            false
        }
    }
}

/// Poll `host:port` until it accepts a TCP connection or `timeout` passes.
async fn probe_ready(host: &str, port: u16, interval: Duration, timeout: Duration) -> bool {
    let attempt = async {
        loop {
            if TcpStream::connect((host, port)).await.is_ok() {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    };
    tokio::time::timeout(timeout, attempt).await.is_ok()
}
