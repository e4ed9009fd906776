//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Header Cloud Foundry's router uses to carry the real destination.
pub const DEFAULT_FORWARDED_URL_HEADER: &str = "X-Cf-Forwarded-Url";

/// Collection endpoint used when no override is configured.
pub const DEFAULT_COLLECT_URL: &str = "https://www.google-analytics.com/collect";

/// Root configuration for the route service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// How inbound requests are retargeted and forwarded.
    pub forwarding: ForwardingConfig,

    /// Analytics collection settings.
    pub analytics: AnalyticsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. The platform hands this out through `PORT`.
    pub port: u16,
}

impl ListenerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Name of the header carrying the forwarded destination URL.
    pub header: String,

    /// Accept invalid upstream certificates.
    pub skip_tls_verification: bool,

    /// Maximum request body buffered before forwarding, in bytes.
    pub max_body_size: usize,

    /// Upstream connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_FORWARDED_URL_HEADER.to_string(),
            skip_tls_verification: false,
            max_body_size: 10 * 1024 * 1024, // 10MB
            connect_timeout_secs: 5,
        }
    }
}

/// Analytics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Tracking identifier. Analytics is disabled when unset or empty.
    pub tracking_id: Option<String>,

    /// Collection endpoint receiving the events.
    pub collect_url: String,

    /// Upper bound for a single event delivery, in seconds.
    pub timeout_secs: u64,

    /// Maximum concurrent deliveries.
    pub max_in_flight: usize,

    /// Content-Type sent with the (JSON) event body.
    pub content_type: String,
}

impl AnalyticsConfig {
    /// The tracking identifier, treating an empty value as absent.
    pub fn tracking_id(&self) -> Option<&str> {
        self.tracking_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            tracking_id: None,
            collect_url: DEFAULT_COLLECT_URL.to_string(),
            timeout_secs: 5,
            max_in_flight: 256,
            content_type: "application/x-www-form-urlencoded".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human readable output for local development.
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log at debug level instead of warn.
    pub debug: bool,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "warn"
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
