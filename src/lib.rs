//! Process-supervising round-robin load balancer.

pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod supervisor;
pub mod worker;

pub use config::schema::ClusterConfig;
pub use http::RequestRouter;
pub use lifecycle::Shutdown;
pub use supervisor::{Supervisor, WorkerPool};
pub use worker::WorkerRuntime;
