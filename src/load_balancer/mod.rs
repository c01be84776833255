//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at the router
//!     → round_robin.rs (pick_next: read cursor, advance modulo N)
//!     → worker index → port = base_port + index + 1
//!     → http::proxy forwards to that port
//! ```
//!
//! # Design Decisions
//! - The balancer is a pure counter: no health, latency or in-flight data
//! - The cursor is owned by the router and only moved through `pick_next`
//! - Dead slots stay in the rotation; a request that lands on one gets a 500

pub mod round_robin;

pub use round_robin::RoundRobin;

/// A worker selection policy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Return the index of the worker for the next request and advance.
    fn pick_next(&self) -> usize;

    /// Number of slots the policy rotates over.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
