//! Round-robin routing cursor.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::LoadBalancer;

/// Round-robin selector over a fixed number of workers.
///
/// The cursor always holds a value in `0..len`. Every call to
/// [`LoadBalancer::pick_next`] returns the current value and advances it in a
/// single atomic step, so concurrent callers each observe a distinct
/// position in the rotation.
#[derive(Debug)]
pub struct RoundRobin {
    cursor: AtomicUsize,
    len: usize,
}

impl RoundRobin {
    /// Create a cursor over `len` workers. A length of zero is treated as one.
    pub fn new(len: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(0),
            len: len.max(1),
        }
    }

    /// Current cursor position (the index the next request will get).
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}

impl LoadBalancer for RoundRobin {
    fn pick_next(&self) -> usize {
        let len = self.len;
        // Closure never returns None, so the update cannot fail.
        match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| Some((current + 1) % len))
        {
            Ok(previous) | Err(previous) => previous,
        }
    }

    fn len(&self) -> usize {
        self.len
    }
}
