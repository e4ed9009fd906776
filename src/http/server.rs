//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener and shut down gracefully
//! - Direct each request, then forward it to its destination

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{request::Parts, HeaderName, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::analytics::{AnalyticsError, Emitter, EventSink};
use crate::config::ProxyConfig;
use crate::http::request;
use crate::http::response::{relay, ProxyError};
use crate::http::upstream::UpstreamClient;
use crate::observability::metrics;
use crate::routing::Director;

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid forwarding header name: {0}")]
    HeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub director: Arc<Director>,
    pub upstream: UpstreamClient,
    pub max_body_size: usize,
}

/// HTTP server for the route service.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server whose analytics sink is built from `config`.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let sink = Emitter::from_config(&config.analytics)?
            .map(|emitter| Arc::new(emitter) as Arc<dyn EventSink>);
        Self::with_sink(config, sink)
    }

    /// Create a server reporting to an arbitrary sink (or none).
    pub fn with_sink(
        config: ProxyConfig,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Result<Self, ServerError> {
        let header: HeaderName = config.forwarding.header.parse()?;
        let director = Arc::new(Director::new(header, sink));
        let upstream = UpstreamClient::new(&config.forwarding)?;

        let state = AppState {
            director,
            upstream,
            max_body_size: config.forwarding.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for driving the service without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            forwarding_header = %self.config.forwarding.header,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Directs the request to its forwarded destination and relays the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let request_id = request::request_id(&parts.headers).to_string();
    let client = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %parts.uri.path(),
        "Proxying request"
    );

    let response = match forward(&state, parts, body, client).await {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_client_error() {
                tracing::warn!(request_id = %request_id, error = %e, "Rejected request");
            } else {
                tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            }
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn forward(
    state: &AppState,
    mut parts: Parts,
    body: Body,
    client: Option<IpAddr>,
) -> Result<Response, ProxyError> {
    let target = state.director.direct(&mut parts)?;

    if let Some(length) = parts
        .headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
    {
        if length > state.max_body_size {
            return Err(ProxyError::BodyTooLarge {
                limit: state.max_body_size,
            });
        }
    }
    let body = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(ProxyError::Body)?;

    request::prepare_upstream_headers(&mut parts.headers, client);

    let upstream = state
        .upstream
        .forward(parts.method, target, parts.headers, body)
        .await?;
    relay(upstream)
}
