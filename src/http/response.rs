//! Responses synthesized by the router itself.
//!
//! The only one is the 500 returned when a worker cannot be reached; every
//! other response comes from a worker unchanged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Message sent to clients when proxying to a worker fails.
pub const PROXY_ERROR_MESSAGE: &str = "Internal server error while proxying to worker";

/// JSON body of the proxy failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyErrorBody {
    pub message: String,
    pub details: String,
}

impl ProxyErrorBody {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            message: PROXY_ERROR_MESSAGE.to_string(),
            details: details.into(),
        }
    }
}

impl IntoResponse for ProxyErrorBody {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
