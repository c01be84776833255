//! Worker descriptor.
//!
//! # Responsibilities
//! - Represent one worker slot (index, port, process id)
//! - Track lifecycle state (Starting/Running/Exited/Restarting)
//! - Carry the per-worker stop signal
//!
//! State and pid are only written by the supervisor's monitor task for this
//! slot. Everyone else reads.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use tokio::sync::Notify;

/// Lifecycle state of a worker slot.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Process spawned (or being spawned), port not yet accepting.
    Starting = 0,
    /// Port accepted a connection.
    Running = 1,
    /// Process gone or never started.
    Exited = 2,
    /// Waiting out the backoff before a relaunch.
    Restarting = 3,
}

impl From<u8> for WorkerState {
    fn from(val: u8) -> Self {
        match val {
            1 => WorkerState::Running,
            2 => WorkerState::Exited,
            3 => WorkerState::Restarting,
            _ => WorkerState::Starting,
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Starting => "starting",
            WorkerState::Running => "running",
            WorkerState::Exited => "exited",
            WorkerState::Restarting => "restarting",
        };
        f.write_str(name)
    }
}

/// A single worker slot in the pool.
#[derive(Debug)]
pub struct WorkerDescriptor {
    index: usize,
    port: u16,
    /// OS process id, 0 when no process is attached.
    pid: AtomicU32,
    state: AtomicU8,
    restarts: AtomicU32,
    stop: Notify,
}

impl WorkerDescriptor {
    pub fn new(index: usize, port: u16) -> Self {
        Self {
            index,
            port,
            pid: AtomicU32::new(0),
            state: AtomicU8::new(WorkerState::Starting as u8),
            restarts: AtomicU32::new(0),
            stop: Notify::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Process id of the attached child, if any.
    pub fn pid(&self) -> Option<u32> {
        match self.pid.load(Ordering::Acquire) {
            0 => None,
            pid => Some(pid),
        }
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from(self.state.load(Ordering::Acquire))
    }

    /// Number of times this slot was relaunched.
    pub fn restarts(&self) -> u32 {
        self.restarts.load(Ordering::Relaxed)
    }

    /// True while a process is attached and has not exited.
    pub fn is_alive(&self) -> bool {
        matches!(self.state(), WorkerState::Starting | WorkerState::Running) && self.pid().is_some()
    }

    /// Ask the monitor task to kill this worker. It will not be restarted.
    pub fn request_stop(&self) {
        self.stop.notify_one();
    }

    pub(crate) async fn stop_requested(&self) {
        self.stop.notified().await
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn set_pid(&self, pid: Option<u32>) {
        self.pid.store(pid.unwrap_or(0), Ordering::Release);
    }

    pub(crate) fn record_restart(&self) -> u32 {
        self.restarts.fetch_add(1, Ordering::Relaxed) + 1
    }
}
