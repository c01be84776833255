//! Worker pool.
//!
//! # Responsibilities
//! - Hold the fixed, ordered set of worker slots
//! - Map slot index to port (`base_port + index + 1`)
//! - Offer a read-only liveness view to the router and operators

use std::time::Duration;

use crate::config::schema::{checked_worker_port, worker_port};
use crate::supervisor::worker::{WorkerDescriptor, WorkerState};

/// Fixed-size, ordered pool of worker slots. Index is the routing key.
#[derive(Debug)]
pub struct WorkerPool {
    base_port: u16,
    workers: Vec<WorkerDescriptor>,
}

impl WorkerPool {
    /// Create `count` slots (at least one) for a router on `base_port`.
    ///
    /// # Panics
    ///
    /// Panics if `base_port + count` exceeds `u16::MAX`; see
    /// [`WorkerPool::try_new`].
    pub fn new(base_port: u16, count: usize) -> Self {
        let workers = (0..count.max(1))
            .map(|index| WorkerDescriptor::new(index, worker_port(base_port, index)))
            .collect();
        Self { base_port, workers }
    }

    /// Like [`WorkerPool::new`], but `None` when the ports do not fit in `u16`.
    pub fn try_new(base_port: u16, count: usize) -> Option<Self> {
        let count = count.max(1);
        checked_worker_port(base_port, count - 1)?;
        Some(Self::new(base_port, count))
    }

    pub fn base_port(&self) -> u16 {
        self.base_port
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WorkerDescriptor> {
        self.workers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerDescriptor> {
        self.workers.iter()
    }

    /// Port of the worker at `index`.
    pub fn port_of(&self, index: usize) -> u16 {
        worker_port(self.base_port, index)
    }

    /// Number of slots with a live process.
    pub fn alive_count(&self) -> usize {
        self.workers.iter().filter(|w| w.is_alive()).count()
    }

    /// Snapshot of `(index, port, state)` for every slot.
    pub fn states(&self) -> Vec<(usize, u16, WorkerState)> {
        self.workers
            .iter()
            .map(|w| (w.index(), w.port(), w.state()))
            .collect()
    }

    /// Kill the worker at `index`. Returns false for an unknown index.
    pub fn stop_worker(&self, index: usize) -> bool {
        match self.workers.get(index) {
            Some(worker) => {
                worker.request_stop();
                true
            }
            None => false,
        }
    }

    /// Wait until no slot is `Starting` or `Restarting`, or `timeout` elapses.
    ///
    /// Returns true when every slot settled in time.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let settled = self
                .workers
                .iter()
                .all(|w| matches!(w.state(), WorkerState::Running | WorkerState::Exited));
            if settled {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
