//! Fire-and-forget analytics delivery.
//!
//! # Responsibilities
//! - Turn a classified endpoint into an `AnalyticsEvent`
//! - POST it to the collection endpoint on its own task
//! - Bound every delivery by a timeout and the in-flight limit
//! - Log and count failures; never report them to the caller

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

use crate::analytics::event::AnalyticsEvent;
use crate::config::AnalyticsConfig;
use crate::observability::metrics;

/// Receives classified requests for reporting.
///
/// `dispatch` must return immediately; delivery happens elsewhere.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, endpoint: String, user_agent: String);
}

/// Errors raised while building or delivering an analytics event.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("failed to build analytics client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid collection URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid analytics content type '{0}'")]
    InvalidContentType(String),

    #[error("unable to compose analytics request: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unable to perform analytics request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("collector responded with status {0}")]
    Status(StatusCode),

    #[error("analytics request timed out after {0:?}")]
    Timeout(Duration),
}

struct Inner {
    client: reqwest::Client,
    collect_url: Url,
    tracking_id: String,
    content_type: HeaderValue,
    timeout: Duration,
    in_flight: Semaphore,
}

/// Sends analytics events to the configured collector.
///
/// Cheap to clone; clones share the client and the in-flight limit.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("collect_url", &self.inner.collect_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

impl Emitter {
    /// Build an emitter, or `None` when no tracking identifier is configured.
    ///
    /// The check happens once; a process started without an identifier never
    /// sends analytics.
    pub fn from_config(config: &AnalyticsConfig) -> Result<Option<Self>, AnalyticsError> {
        match config.tracking_id() {
            Some(tracking_id) => Self::new(tracking_id, config).map(Some),
            None => {
                tracing::warn!("No analytics tracking id set, disabling analytics calls");
                Ok(None)
            }
        }
    }

    pub fn new(tracking_id: &str, config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let collect_url =
            Url::parse(&config.collect_url).map_err(|source| AnalyticsError::InvalidUrl {
                url: config.collect_url.clone(),
                source,
            })?;
        let content_type = HeaderValue::from_str(&config.content_type)
            .map_err(|_| AnalyticsError::InvalidContentType(config.content_type.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(AnalyticsError::Client)?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                collect_url,
                tracking_id: tracking_id.to_string(),
                content_type,
                timeout: config.timeout(),
                in_flight: Semaphore::new(config.max_in_flight.min(Semaphore::MAX_PERMITS)),
            }),
        })
    }

    /// Build the event for one classified request.
    pub fn event(&self, endpoint: String, user_agent: String) -> AnalyticsEvent {
        AnalyticsEvent::pageview(&self.inner.tracking_id, endpoint, user_agent)
    }

    /// POST one event and check the collector's status.
    pub async fn send(&self, event: &AnalyticsEvent) -> Result<StatusCode, AnalyticsError> {
        let body = event.to_body()?;

        let response = self
            .inner
            .client
            .post(self.inner.collect_url.clone())
            .header(CONTENT_TYPE, self.inner.content_type.clone())
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::Status(status));
        }
        Ok(status)
    }

    /// Wait for an in-flight slot and send, all within the delivery timeout.
    pub async fn deliver(&self, event: &AnalyticsEvent) -> Result<StatusCode, AnalyticsError> {
        let attempt = async {
            // Acquisition only fails on a closed semaphore, and this one is never closed.
            let _permit = self.inner.in_flight.acquire().await.ok();
            self.send(event).await
        };

        match tokio::time::timeout(self.inner.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Timeout(self.inner.timeout)),
        }
    }
}

impl EventSink for Emitter {
    fn dispatch(&self, endpoint: String, user_agent: String) {
        let event = self.event(endpoint, user_agent);
        let emitter = self.clone();

        tokio::spawn(async move {
            tracing::debug!(endpoint = %event.document_location, "Sending analytics record");

            match emitter.deliver(&event).await {
                Ok(status) => {
                    metrics::record_analytics("sent");
                    tracing::debug!(status = %status, "Received response from analytics collector");
                }
                Err(e @ AnalyticsError::Timeout(_)) => {
                    metrics::record_analytics("timeout");
                    tracing::error!(error = %e, endpoint = %event.document_location, "Analytics record dropped");
                }
                Err(e) => {
                    metrics::record_analytics("failed");
                    tracing::error!(error = %e, endpoint = %event.document_location, "Analytics record dropped");
                }
            }
        });
    }
}
