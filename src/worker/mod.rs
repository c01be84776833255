//! Worker runtime: the HTTP server each worker process runs.
//!
//! # Responsibilities
//! - Bind `host:port` handed over by the supervisor (via env)
//! - Serve the application router
//! - Tag responses with the serving port (`x-served-by`)
//! - Log a periodic liveness line
//!
//! The runtime knows nothing about the load balancer; any application
//! router can be plugged in.

use std::future::Future;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Response header naming the port of the worker that served the request.
pub const SERVED_BY_HEADER: &str = "x-served-by";

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Error type for the worker runtime.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("worker server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// One worker's HTTP server.
#[derive(Debug, Clone)]
pub struct WorkerRuntime {
    index: Option<usize>,
    host: String,
    port: u16,
}

impl WorkerRuntime {
    pub fn new(index: Option<usize>, host: impl Into<String>, port: u16) -> Self {
        Self {
            index,
            host: host.into(),
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wrap `application` with tracing and the `x-served-by` header.
    pub fn app(&self, application: Router) -> Router {
        let served_by = HeaderValue::from(self.port);
        application
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static(SERVED_BY_HEADER),
                served_by,
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve `application` until `shutdown` resolves.
    pub async fn run<F>(self, application: Router, shutdown: F) -> Result<(), WorkerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| WorkerError::Bind {
                address: address.clone(),
                source,
            })?;

        tracing::info!(worker = ?self.index, address = %address, "Worker is listening");

        let heartbeat = tokio::spawn(heartbeat(self.port));
        let result = axum::serve(listener, self.app(application))
            .with_graceful_shutdown(shutdown)
            .await;
        heartbeat.abort();

        tracing::info!(worker = ?self.index, port = self.port, "Worker stopped");
        result.map_err(WorkerError::from)
    }
}

async fn heartbeat(port: u16) {
    let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        tracing::debug!(port, "Worker still alive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    #[tokio::test]
    async fn responses_carry_served_by() {
        let runtime = WorkerRuntime::new(Some(0), "127.0.0.1", 4001);
        let app = runtime.app(Router::new().route("/", get(|| async { "ok" })));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVED_BY_HEADER], "4001");
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let runtime = WorkerRuntime::new(None, "127.0.0.1", port);
        let err = runtime.run(Router::new(), async {}).await.unwrap_err();
        assert!(matches!(err, WorkerError::Bind { .. }));
    }

    #[tokio::test]
    async fn serves_until_shutdown() {
        let shutdown = crate::lifecycle::Shutdown::new();
        let runtime = WorkerRuntime::new(Some(1), "127.0.0.1", 29201);
        let app = Router::new().route("/ping", get(|| async { "pong" }));
        let server = tokio::spawn(runtime.run(app, shutdown.signalled()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        let stream = tokio::net::TcpStream::connect("127.0.0.1:29201").await;
        assert!(stream.is_ok());
        drop(stream);

        shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}
