//! Request router: the load balancer's front listener.
//!
//! # Responsibilities
//! - Accept every method and path on `base_port`
//! - Pick the next worker with the round-robin cursor
//! - Hand the untouched request to the proxy forwarder
//! - Drain in-flight requests on shutdown

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::http::proxy::ProxyForwarder;
use crate::load_balancer::{LoadBalancer, RoundRobin};
use crate::net::BoundedListener;
use crate::supervisor::WorkerPool;

/// State injected into the proxy handler.
#[derive(Clone)]
struct RouterState {
    balancer: Arc<dyn LoadBalancer>,
    pool: Arc<WorkerPool>,
    forwarder: ProxyForwarder,
}

/// HTTP front end that spreads requests over the worker pool.
pub struct RequestRouter {
    state: RouterState,
}

impl RequestRouter {
    /// Route over every slot in `pool`, in index order.
    pub fn new(pool: Arc<WorkerPool>, forwarder: ProxyForwarder) -> Self {
        let balancer: Arc<dyn LoadBalancer> = Arc::new(RoundRobin::new(pool.len()));
        Self {
            state: RouterState {
                balancer,
                pool,
                forwarder,
            },
        }
    }

    /// Index of the worker that gets the next request. Advances the cursor.
    pub fn pick_next(&self) -> usize {
        self.state.balancer.pick_next()
    }

    /// Port the next request would be sent to. Advances the cursor.
    pub fn next_port(&self) -> u16 {
        self.state.pool.port_of(self.pick_next())
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.state.pool
    }

    /// Build the Axum router: one catch-all handler, traced.
    pub fn app(&self) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` resolves, then drain open connections.
    pub async fn serve<F>(self, listener: BoundedListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = axum::serve::Listener::local_addr(&listener)?;
        tracing::info!(
            address = %addr,
            workers = self.state.pool.len(),
            "Load balancer is running"
        );

        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Load balancer stopped");
        Ok(())
    }
}

/// Pick a worker and relay the request to it.
async fn proxy_handler(State(state): State<RouterState>, request: Request<Body>) -> Response {
    let worker = state.balancer.pick_next();
    let port = state.pool.port_of(worker);

    tracing::debug!(
        worker,
        port,
        method = %request.method(),
        path = %request.uri(),
        "Routing request"
    );

    state.forwarder.forward(request, worker, port).await
}
