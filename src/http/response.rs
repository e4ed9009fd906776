//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map proxy failures to HTTP status codes
//! - Copy upstream responses back without hop-by-hop headers
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - A bad forwarding header is the caller's fault: 400
//! - Upstream failures are 502, upstream timeouts 504

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::request::strip_hop_by_hop;
use crate::routing::ForwardedUrlError;

/// Errors that end a proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid forwarding header: {0}")]
    Forwarded(#[from] ForwardedUrlError),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Forwarded(_) => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Body(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Response(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::Forwarded(e) => e.to_string(),
            ProxyError::BodyTooLarge { .. } => self.to_string(),
            ProxyError::Body(_) => "Failed to read request body".to_string(),
            ProxyError::Upstream(_) | ProxyError::Response(_) => {
                "Upstream request failed".to_string()
            }
        };
        (self.status(), body).into_response()
    }
}

/// Convert an upstream response into one for the original caller.
pub fn relay(upstream: reqwest::Response) -> Result<Response, ProxyError> {
    let mut builder = Response::builder().status(upstream.status());
    if let Some(headers) = builder.headers_mut() {
        headers.extend(upstream.headers().clone());
        strip_hop_by_hop(headers);
    }

    Ok(builder.body(Body::from_stream(upstream.bytes_stream()))?)
}
