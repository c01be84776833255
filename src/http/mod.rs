//! HTTP data plane of the primary process.
//!
//! # Data Flow
//! ```text
//! BoundedListener (net)
//!     → server.rs (RequestRouter: pick_next → worker index → port)
//!     → proxy.rs (ProxyForwarder: stream request to 127.0.0.1:port,
//!                 stream response back)
//!     → response.rs (500 JSON when the worker cannot be reached)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Method, path, query, headers and status pass through verbatim
//! - Bodies are streamed in both directions, never buffered
//! - Upstream failures end the request with a 500; no retry, no re-route

pub mod proxy;
pub mod response;
pub mod server;

pub use proxy::{ProxyError, ProxyForwarder};
pub use response::{ProxyErrorBody, PROXY_ERROR_MESSAGE};
pub use server::RequestRouter;
