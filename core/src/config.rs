//! Process configuration resolved once from the environment.
//!
//! | Variable             | Default                 |
//! |----------------------|-------------------------|
//! | `MESSAGE_QUEUE_URL`  | `nats://localhost:4222` |
//! | `ELASTICSEARCH_URL`  | `http://localhost:9200` |
//! | `METRICS_ADDR`       | unset (no exporter)     |
//!
//! An empty value is treated the same as an unset one.
//!
//! # Example
//!
//! ```
//! use product_launch_core::config::Config;
//!
//! let config = Config::from_lookup(|name| match name {
//!     "MESSAGE_QUEUE_URL" => Some("nats://message-queue:4222".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(config.message_queue_url, "nats://message-queue:4222");
//! assert_eq!(config.elasticsearch_url, "http://localhost:9200");
//! ```

use std::net::SocketAddr;
use thiserror::Error;

/// Default message broker URL.
pub const DEFAULT_MESSAGE_QUEUE_URL: &str = "nats://localhost:4222";

/// Default search index service URL.
pub const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but its value cannot be used
    #[error("Invalid value '{value}' for {variable}: {reason}")]
    Invalid {
        /// Environment variable name
        variable: &'static str,
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Resolved configuration, passed by value to constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Message broker URL
    pub message_queue_url: String,
    /// Search index service base URL
    pub elasticsearch_url: String,
    /// Address for the Prometheus scrape endpoint, if enabled
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    /// Resolve configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a set value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a URL has no scheme or
    /// `METRICS_ADDR` is not a socket address.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let message_queue_url = var("MESSAGE_QUEUE_URL")
            .unwrap_or_else(|| DEFAULT_MESSAGE_QUEUE_URL.to_string());
        check_url("MESSAGE_QUEUE_URL", &message_queue_url)?;

        let elasticsearch_url = var("ELASTICSEARCH_URL")
            .unwrap_or_else(|| DEFAULT_ELASTICSEARCH_URL.to_string());
        check_url("ELASTICSEARCH_URL", &elasticsearch_url)?;

        let metrics_addr = var("METRICS_ADDR")
            .map(|value| {
                value.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                    variable: "METRICS_ADDR",
                    reason: e.to_string(),
                    value,
                })
            })
            .transpose()?;

        Ok(Self {
            message_queue_url,
            elasticsearch_url,
            metrics_addr,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            message_queue_url: DEFAULT_MESSAGE_QUEUE_URL.to_string(),
            elasticsearch_url: DEFAULT_ELASTICSEARCH_URL.to_string(),
            metrics_addr: None,
        }
    }
}

fn check_url(variable: &'static str, value: &str) -> Result<(), ConfigError> {
    match value.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => Ok(()),
        _ => Err(ConfigError::Invalid {
            variable,
            value: value.to_string(),
            reason: "expected <scheme>://<host>".to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config =
            Config::from_lookup(lookup(&[("MESSAGE_QUEUE_URL", ""), ("ELASTICSEARCH_URL", "  ")]))
                .unwrap();

        assert_eq!(config.message_queue_url, DEFAULT_MESSAGE_QUEUE_URL);
        assert_eq!(config.elasticsearch_url, DEFAULT_ELASTICSEARCH_URL);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("ELASTICSEARCH_URL", "  http://elasticsearch:9200\n"),
            ("METRICS_ADDR", " 0.0.0.0:9090 "),
        ]))
        .unwrap();

        assert_eq!(config.elasticsearch_url, "http://elasticsearch:9200");
        assert_eq!(config.metrics_addr, Some("0.0.0.0:9090".parse().unwrap()));
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("MESSAGE_QUEUE_URL", "nats://message-queue:4222"),
            ("ELASTICSEARCH_URL", "http://elasticsearch:9200"),
            ("METRICS_ADDR", "0.0.0.0:9090"),
        ]))
        .unwrap();

        assert_eq!(config.message_queue_url, "nats://message-queue:4222");
        assert_eq!(config.elasticsearch_url, "http://elasticsearch:9200");
        assert_eq!(config.metrics_addr, Some("0.0.0.0:9090".parse().unwrap()));
    }

    #[test]
    fn rejects_url_without_scheme() {
        let err = Config::from_lookup(lookup(&[("ELASTICSEARCH_URL", "elasticsearch:9200")]))
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { variable: "ELASTICSEARCH_URL", .. }
        ));
    }

    #[test]
    fn rejects_bad_metrics_addr() {
        let err = Config::from_lookup(lookup(&[("METRICS_ADDR", "not-an-addr")])).unwrap_err();
        assert!(err.to_string().contains("METRICS_ADDR"));
    }
}
