//! Proxy forwarder.
//!
//! # Responsibilities
//! - Rewrite the request target to `http://<upstream_host>:<port><path?query>`
//! - Keep method, headers (including `Host`) and body untouched
//! - Stream the worker's status, headers and body back unchanged
//! - Turn connect/reset/timeout failures into the 500 JSON response
//!
//! # Design Decisions
//! - Outbound requests are always HTTP/1.1 (workers speak HTTP/1.1 only)
//! - The client only fills in `Host` when the inbound request had none
//! - Dropping the returned future (client went away) drops the outbound
//!   request and its connection

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Uri, Version};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::http::response::ProxyErrorBody;
use crate::observability::metrics;

/// Failure to obtain a response from a worker.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid upstream uri")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("upstream request failed")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl ProxyError {
    /// Human-readable diagnostic including every underlying cause.
    pub fn details(&self) -> String {
        error_chain(self)
    }
}

/// Join an error and its sources with `": "`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Relays requests to worker processes.
#[derive(Debug, Clone)]
pub struct ProxyForwarder {
    client: Client<HttpConnector, Body>,
    upstream_host: String,
    upstream_timeout: Duration,
}

impl ProxyForwarder {
    /// Build a forwarder that connects to workers on `upstream_host`.
    pub fn new(upstream_host: impl Into<String>, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            upstream_host: upstream_host.into(),
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Forward `request` to the worker on `target_port`.
    ///
    /// Always yields a response: the worker's, or a 500 JSON body describing
    /// why the worker could not be reached.
    pub async fn forward(&self, request: Request<Body>, worker: usize, target_port: u16) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let uri = request.uri().clone();
        let headers = request.headers().clone();

        match self.try_forward(request, target_port).await {
            Ok(response) => {
                metrics::record_request(worker, response.status().as_u16(), start);
                response
            }
            Err(e) => {
                let details = e.details();
                tracing::error!(
                    worker,
                    target_port,
                    method = %method,
                    path = %uri,
                    headers = ?headers,
                    error = %details,
                    "Error while proxying to worker"
                );
                metrics::record_proxy_error(worker);
                metrics::record_request(worker, 500, start);
                ProxyErrorBody::new(details).into_response()
            }
        }
    }

    /// Forward without converting failures.
    pub async fn try_forward(&self, request: Request<Body>, target_port: u16) -> Result<Response, ProxyError> {
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        parts.uri = Uri::try_from(format!(
            "http://{}:{}{}",
            self.upstream_host, target_port, path_and_query
        ))?;
        parts.version = Version::HTTP_11;

        let outbound = Request::from_parts(parts, body);

        let response: hyper::Response<Incoming> =
            tokio::time::timeout(self.upstream_timeout, self.client.request(outbound))
                .await
                .map_err(|_| ProxyError::Timeout(self.upstream_timeout))??;

        // The worker's body is relayed frame by frame as it arrives.
        Ok(response.map(Body::new))
    }
}
