//! Forwarded destination extraction.
//!
//! The platform router tells a route service where a request was really headed
//! through a single header holding an absolute URL. Anything other than an
//! absolute `http`/`https` URL with a host is rejected for that request only.

use axum::http::{HeaderMap, HeaderName};
use thiserror::Error;
use url::Url;

/// Reasons a forwarded destination cannot be used.
#[derive(Debug, Error)]
pub enum ForwardedUrlError {
    #[error("missing {0} header")]
    Missing(HeaderName),

    #[error("{0} header is not valid UTF-8")]
    InvalidEncoding(HeaderName),

    #[error("invalid forwarded URL '{value}': {source}")]
    Invalid {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme '{0}' in forwarded URL")]
    UnsupportedScheme(String),

    #[error("forwarded URL '{0}' has no host")]
    MissingHost(String),

    #[error("forwarded URL '{0}' cannot be used as a request target")]
    Target(String),
}

/// Read and parse the forwarded destination from `headers`.
pub fn forwarded_destination(
    headers: &HeaderMap,
    name: &HeaderName,
) -> Result<Url, ForwardedUrlError> {
    let raw = headers
        .get(name)
        .ok_or_else(|| ForwardedUrlError::Missing(name.clone()))?
        .to_str()
        .map_err(|_| ForwardedUrlError::InvalidEncoding(name.clone()))?
        .trim();

    let url = Url::parse(raw).map_err(|source| ForwardedUrlError::Invalid {
        value: raw.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ForwardedUrlError::UnsupportedScheme(url.scheme().to_string()));
    }
    if !url.has_host() {
        return Err(ForwardedUrlError::MissingHost(raw.to_string()));
    }

    Ok(url)
}

/// The `host[:port]` part of a URL, as it belongs in a `Host` header.
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}
