//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tokio::net::{TcpListener, TcpStream};

use worker_cluster::config::TimeoutConfig;
use worker_cluster::http::{ProxyForwarder, RequestRouter};
use worker_cluster::net::BoundedListener;
use worker_cluster::{Shutdown, WorkerPool};

/// Ports of the mock workers, in the order requests reached them.
pub type Hits = Arc<Mutex<Vec<u16>>>;

pub fn hits() -> Hits {
    Arc::new(Mutex::new(Vec::new()))
}

#[derive(Clone)]
struct MockWorker {
    port: u16,
    hits: Hits,
}

/// Start a mock worker on `127.0.0.1:port`.
///
/// - `/echo` streams the request body back
/// - `/status/{code}` answers with that status
/// - anything else answers `served by {port}`
///
/// Every response carries `x-served-by` and `x-mock`, plus the host, target
/// and method the worker saw (`x-seen-host`, `x-seen-uri`, `x-seen-method`).
/// Triggering the returned `Shutdown` stops accepting connections.
pub async fn start_mock_worker(port: u16, hits: Hits) -> Shutdown {
    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let app = Router::new()
        .fallback(mock_handler)
        .with_state(MockWorker { port, hits });

    let shutdown = Shutdown::new();
    let signal = shutdown.signalled();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).with_graceful_shutdown(signal).await;
    });
    shutdown
}

async fn mock_handler(State(worker): State<MockWorker>, request: Request<Body>) -> Response {
    worker.hits.lock().unwrap().push(worker.port);

    let seen_host = request
        .headers()
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    let path = request.uri().path().to_string();
    let seen_uri = request.uri().to_string();
    let seen_method = request.method().to_string();
    let builder = Response::builder()
        .header("x-seen-uri", seen_uri)
        .header("x-seen-method", seen_method)
        .header("x-served-by", worker.port.to_string())
        .header("x-mock", "yes")
        .header("x-seen-host", seen_host);

    if path == "/echo" {
        return builder.body(request.into_body()).unwrap();
    }
    if let Some(code) = path.strip_prefix("/status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::BAD_REQUEST);
        return builder
            .status(status)
            .body(Body::from(format!("status {}", status.as_u16())))
            .unwrap();
    }
    builder
        .body(Body::from(format!("served by {}", worker.port)))
        .unwrap()
}

/// Start a router on `127.0.0.1:base_port` over `workers` slots.
pub async fn start_router(base_port: u16, workers: usize) -> (Shutdown, Arc<WorkerPool>) {
    let pool = Arc::new(WorkerPool::new(base_port, workers));
    let forwarder = ProxyForwarder::new("127.0.0.1", &TimeoutConfig::default());
    let router = RequestRouter::new(pool.clone(), forwarder);
    let listener = BoundedListener::bind(&format!("127.0.0.1:{base_port}"), 1000)
        .await
        .unwrap();

    let shutdown = Shutdown::new();
    tokio::spawn(router.serve(listener, shutdown.signalled()));
    (shutdown, pool)
}

/// Client without connection reuse or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Wait until `port` accepts TCP connections.
pub async fn wait_for_port(port: u16, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Wait until `port` refuses TCP connections.
pub async fn wait_for_port_closed(port: u16, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if TcpStream::connect(("127.0.0.1", port)).await.is_err() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
