//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: '{value}'")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Flags are only switched on by the literal string `true`.
fn flag(value: &str) -> bool {
    value == "true"
}

impl ProxyConfig {
    /// Overlay settings from environment-style variables.
    ///
    /// `lookup` abstracts `std::env::var` so the mapping can be tested without
    /// touching the process environment. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            self.listener.port = port.parse().map_err(|_| ConfigError::Env {
                name: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(id) = get("GOOGLE_ANALYTICS_TRACKING_ID") {
            self.analytics.tracking_id = Some(id);
        }
        if let Some(url) = get("GOOGLE_ANALYTICS_URL") {
            self.analytics.collect_url = url;
        }
        if let Some(skip) = get("SKIP_SSL_VALIDATION") {
            self.forwarding.skip_tls_verification = flag(&skip);
        }
        if let Some(header) = get("FORWARDED_URL_HEADER") {
            self.forwarding.header = header;
        }
        if let Some(debug) = get("DEBUG") {
            self.observability.debug = flag(&debug);
        }
        if let Some(format) = get("LOG_FORMAT") {
            self.observability.log_format = format.parse().map_err(|_| ConfigError::Env {
                name: "LOG_FORMAT",
                value: format.clone(),
            })?;
        }
        if let Some(addr) = get("METRICS_ADDRESS") {
            self.observability.metrics_enabled = true;
            self.observability.metrics_address = addr;
        }

        Ok(())
    }
}

/// Build the effective configuration: defaults, optional file, then environment.
pub fn load(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    config.apply_env(|name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_overlay() {
        let mut config = ProxyConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "9191"),
                ("GOOGLE_ANALYTICS_TRACKING_ID", "UA-42"),
                ("GOOGLE_ANALYTICS_URL", "http://collector.local/collect"),
                ("SKIP_SSL_VALIDATION", "true"),
                ("DEBUG", "true"),
                ("LOG_FORMAT", "pretty"),
            ]))
            .unwrap();

        assert_eq!(config.listener.port, 9191);
        assert_eq!(config.analytics.tracking_id(), Some("UA-42"));
        assert_eq!(config.analytics.collect_url, "http://collector.local/collect");
        assert!(config.forwarding.skip_tls_verification);
        assert!(config.observability.debug);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_flags_require_literal_true() {
        let mut config = ProxyConfig::default();
        config
            .apply_env(env(&[("SKIP_SSL_VALIDATION", "1"), ("DEBUG", "TRUE")]))
            .unwrap();

        assert!(!config.forwarding.skip_tls_verification);
        assert!(!config.observability.debug);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut config = ProxyConfig::default();
        config
            .apply_env(env(&[("PORT", ""), ("GOOGLE_ANALYTICS_TRACKING_ID", "")]))
            .unwrap();

        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.analytics.tracking_id, None);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut config = ProxyConfig::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: "PORT", .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!(
            "analytics-route-service-{}.toml",
            uuid::Uuid::new_v4()
        ));
        fs::write(
            &path,
            "[analytics]\ntracking_id = \"UA-FILE\"\ncollect_url = \"nope\"\n",
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref e) if e.len() == 1));

        let config = read_config(&path).unwrap();
        assert_eq!(config.analytics.tracking_id(), Some("UA-FILE"));

        fs::remove_file(&path).unwrap();
    }
}
