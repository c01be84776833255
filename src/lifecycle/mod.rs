//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main):
//!     Load config → Validate → Start supervisor → Bind router
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → router stops accepting and drains
//!               → supervisor kills and reaps every worker
//! ```
//!
//! # Design Decisions
//! - Workers are children of the primary; they never outlive a clean
//!   shutdown
//! - Workers handle their own signals and exit on SIGTERM/SIGINT too

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
