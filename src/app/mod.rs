//! Default worker application: an in-memory users API.
//!
//! Every worker process owns its own store; nothing is shared between
//! workers, so a record created through one worker is only visible through
//! that worker.

pub mod store;
pub mod users;

pub use store::{User, UserStore};
pub use users::users_router;
