//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0 and bounded)
//! - Check that URLs, header names and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("forwarding.header '{0}' is not a valid header name")]
    InvalidHeaderName(String),

    #[error("analytics.collect_url '{0}' is not an absolute http(s) URL")]
    InvalidCollectUrl(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: usize },
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if HeaderName::from_bytes(config.forwarding.header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.forwarding.header.clone(),
        ));
    }

    let collect_ok = Url::parse(&config.analytics.collect_url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !collect_ok {
        errors.push(ValidationError::InvalidCollectUrl(
            config.analytics.collect_url.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let positive = [
        ("analytics.timeout_secs", config.analytics.timeout_secs as usize),
        ("analytics.max_in_flight", config.analytics.max_in_flight),
        ("forwarding.max_body_size", config.forwarding.max_body_size),
        (
            "forwarding.connect_timeout_secs",
            config.forwarding.connect_timeout_secs as usize,
        ),
        ("timeouts.request_secs", config.timeouts.request_secs as usize),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if config.analytics.max_in_flight > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::TooLarge {
            field: "analytics.max_in_flight",
            max: Semaphore::MAX_PERMITS,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
