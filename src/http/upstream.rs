//! Upstream transport.
//!
//! Sends a retargeted request to its forwarded destination and hands back the
//! raw upstream response. Redirects are relayed to the caller, not followed.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use url::Url;

use crate::config::ForwardingConfig;
use crate::http::response::ProxyError;

/// HTTP client used for forwarding.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: &ForwardingConfig) -> Result<Self, reqwest::Error> {
        if config.skip_tls_verification {
            tracing::warn!("Upstream TLS certificate validation is disabled");
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.skip_tls_verification)
            .no_proxy()
            .build()?;

        Ok(Self { client })
    }

    /// Forward a request. Headers are sent as given.
    pub async fn forward(
        &self,
        method: Method,
        target: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut request = self.client.request(method, target).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }
        let response = request.send().await?;

        tracing::debug!(url = %response.url(), status = %response.status(), "Relaying upstream response");
        Ok(response)
    }
}
