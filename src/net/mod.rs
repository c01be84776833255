//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limit)
//!     → Hand off to the router's HTTP stack (axum::serve)
//! ```
//!
//! # Design Decisions
//! - A connection holds its permit until the socket is dropped
//! - Accept errors are logged and retried, never fatal

pub mod listener;

pub use listener::{BoundedListener, LimitedStream, ListenerError};
