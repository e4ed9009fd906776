//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use analytics_route_service::analytics::AnalyticsEvent;
use analytics_route_service::config::ProxyConfig;
use analytics_route_service::{HttpServer, Shutdown};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// What the mock collector saw for one POST.
#[derive(Debug)]
#[allow(dead_code)]
pub struct CollectedHit {
    pub content_type: Option<String>,
    pub content_length: Option<usize>,
    pub body_len: usize,
    pub event: AnalyticsEvent,
}

/// Start a mock upstream that echoes what it received as JSON.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(|request: Request<axum::body::Body>| async move {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, 1024 * 1024).await.unwrap_or_default();
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Json(json!({
            "method": parts.method.as_str(),
            "path": parts.uri.path(),
            "query": parts.uri.query(),
            "host": header("host"),
            "x_request_id": header("x-request-id"),
            "x_forwarded_for": header("x-forwarded-for"),
            "body": String::from_utf8_lossy(&body),
        }))
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a mock analytics collector answering with `status` after `delay`.
///
/// Every hit is parsed and pushed onto the returned channel on arrival.
pub async fn start_collector(
    status: StatusCode,
    delay: Duration,
) -> (String, mpsc::UnboundedReceiver<CollectedHit>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let app = Router::new()
        .route(
            "/collect",
            post(
                move |State(tx): State<mpsc::UnboundedSender<CollectedHit>>,
                      headers: HeaderMap,
                      body: Bytes| async move {
                    // The body is JSON whatever the declared content type.
                    let event: AnalyticsEvent = serde_json::from_slice(&body).unwrap();
                    let _ = tx.send(CollectedHit {
                        content_type: headers
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                        content_length: headers
                            .get("content-length")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse().ok()),
                        body_len: body.len(),
                        event,
                    });
                    tokio::time::sleep(delay).await;
                    status
                },
            ),
        )
        .with_state(tx);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/collect", addr), rx)
}

/// Config pointing analytics at `collect_url`, optionally with a tracking id.
pub fn config(collect_url: &str, tracking_id: Option<&str>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.analytics.collect_url = collect_url.to_string();
    config.analytics.tracking_id = tracking_id.map(str::to_string);
    config.analytics.timeout_secs = 2;
    config
}

/// Start the route service; returns its address and the shutdown handle.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Next collected hit, or `None` if nothing arrives within `wait`.
pub async fn next_hit(
    rx: &mut mpsc::UnboundedReceiver<CollectedHit>,
    wait: Duration,
) -> Option<CollectedHit> {
    tokio::time::timeout(wait, rx.recv()).await.ok().flatten()
}

#[allow(dead_code)]
pub async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}
