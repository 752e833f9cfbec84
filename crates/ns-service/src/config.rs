//! Notification Service configuration.
//!
//! Configuration is loaded from environment variables. Every setting has a
//! default, so an empty environment yields a runnable worker. Malformed values
//! are rejected with [`ConfigError::InvalidValue`]; the binary logs the error
//! and falls back to [`Config::default`].

use crate::network::{MinTlsVersion, NetworkDefaults};
use std::collections::HashMap;
use std::env;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use thiserror::Error;

/// Default service name reported in health check records.
pub const DEFAULT_SERVICE_NAME: &str = "NotificationService";

/// Default path answered by the health endpoint.
pub const DEFAULT_HEALTH_PATH: &str = "/health-monitoring";

/// Fallback health endpoint address when no endpoint is allocated.
pub const DEFAULT_HEALTH_BIND_ADDRESS: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8082));

/// Default heartbeat interval in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECONDS: u64 = 5;

/// Log output format for the binary's tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Notification Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported in every `HealthCheckRecord` (default: "NotificationService").
    pub service_name: String,

    /// Address allocated to this instance for health probes, if any.
    pub health_endpoint: Option<SocketAddr>,

    /// Path answered by the health endpoint (default: "/health-monitoring").
    pub health_path: String,

    /// Interval between heartbeats (default: 5s).
    pub heartbeat_interval: Duration,

    /// Queue the worker will consume from. Advisory only, logged at startup.
    pub notifications_queue_name: Option<String>,

    /// Process-wide outbound network defaults applied once at startup.
    pub network: NetworkDefaults,

    /// Log output format (default: text).
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            health_endpoint: None,
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECONDS),
            notifications_queue_name: None,
            network: NetworkDefaults::default(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let service_name = vars
            .get("NS_SERVICE_NAME")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());

        let health_endpoint = vars
            .get("NS_HEALTH_ENDPOINT")
            .map(|s| {
                s.parse::<SocketAddr>().map_err(|e| {
                    ConfigError::InvalidValue(format!("NS_HEALTH_ENDPOINT '{s}': {e}"))
                })
            })
            .transpose()?;

        let health_path = vars
            .get("NS_HEALTH_PATH")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string());
        if !health_path.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "NS_HEALTH_PATH must start with '/', got '{health_path}'"
            )));
        }

        let heartbeat_interval_seconds =
            parse_positive(vars, "NS_HEARTBEAT_INTERVAL_SECONDS")?
                .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL_SECONDS);

        let notifications_queue_name = vars
            .get("NS_NOTIFICATIONS_QUEUE_NAME")
            .filter(|s| !s.trim().is_empty())
            .cloned();

        let defaults = NetworkDefaults::default();

        let min_tls_version = vars
            .get("NS_MIN_TLS_VERSION")
            .map(|s| {
                s.parse::<MinTlsVersion>()
                    .map_err(|e| ConfigError::InvalidValue(format!("NS_MIN_TLS_VERSION: {e}")))
            })
            .transpose()?
            .unwrap_or(defaults.min_tls_version);

        let max_outbound_connections = parse_positive(vars, "NS_MAX_OUTBOUND_CONNECTIONS")?
            .map(usize::try_from)
            .transpose()
            .map_err(|e| ConfigError::InvalidValue(format!("NS_MAX_OUTBOUND_CONNECTIONS: {e}")))?
            .unwrap_or(defaults.max_outbound_connections);

        let log_format = match vars.get("NS_LOG_FORMAT").map(String::as_str) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue(format!(
                    "NS_LOG_FORMAT must be 'text' or 'json', got '{other}'"
                )))
            }
        };

        Ok(Config {
            service_name,
            health_endpoint,
            health_path,
            heartbeat_interval: Duration::from_secs(heartbeat_interval_seconds),
            notifications_queue_name,
            network: NetworkDefaults {
                min_tls_version,
                max_outbound_connections,
            },
            log_format,
        })
    }

    /// Address the health endpoint binds to: the allocated endpoint when
    /// present, otherwise `127.0.0.1:8082`.
    #[must_use]
    pub fn health_bind_address(&self) -> SocketAddr {
        self.health_endpoint.unwrap_or(DEFAULT_HEALTH_BIND_ADDRESS)
    }
}

/// Parse an optional strictly positive integer variable.
fn parse_positive(vars: &HashMap<String, String>, key: &str) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = vars.get(key) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue(format!(
            "{key} must be greater than zero"
        ))),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(ConfigError::InvalidValue(format!("{key} '{raw}': {e}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_empty_uses_defaults() {
        let config = Config::from_vars(&HashMap::new()).expect("Config should load successfully");

        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.health_endpoint, None);
        assert_eq!(config.health_path, DEFAULT_HEALTH_PATH);
        assert_eq!(
            config.heartbeat_interval,
            Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECONDS)
        );
        assert_eq!(config.notifications_queue_name, None);
        assert_eq!(config.network, NetworkDefaults::default());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_health_bind_address_falls_back_to_loopback() {
        let config = Config::default();
        assert_eq!(
            config.health_bind_address(),
            "127.0.0.1:8082".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_health_bind_address_prefers_allocated_endpoint() {
        let vars = HashMap::from([(
            "NS_HEALTH_ENDPOINT".to_string(),
            "10.0.0.4:20000".to_string(),
        )]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(
            config.health_bind_address(),
            "10.0.0.4:20000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("NS_SERVICE_NAME".to_string(), "ns-eu-1".to_string()),
            ("NS_HEALTH_PATH".to_string(), "/probe".to_string()),
            ("NS_HEARTBEAT_INTERVAL_SECONDS".to_string(), "30".to_string()),
            (
                "NS_NOTIFICATIONS_QUEUE_NAME".to_string(),
                "notifications".to_string(),
            ),
            ("NS_MIN_TLS_VERSION".to_string(), "1.3".to_string()),
            ("NS_MAX_OUTBOUND_CONNECTIONS".to_string(), "48".to_string()),
            ("NS_LOG_FORMAT".to_string(), "json".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.service_name, "ns-eu-1");
        assert_eq!(config.health_path, "/probe");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(
            config.notifications_queue_name.as_deref(),
            Some("notifications")
        );
        assert_eq!(config.network.min_tls_version, MinTlsVersion::Tls13);
        assert_eq!(config.network.max_outbound_connections, 48);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_queue_name_is_treated_as_missing() {
        let vars = HashMap::from([(
            "NS_NOTIFICATIONS_QUEUE_NAME".to_string(),
            "   ".to_string(),
        )]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.notifications_queue_name, None);
    }

    #[test]
    fn test_invalid_health_endpoint_rejected() {
        let vars = HashMap::from([("NS_HEALTH_ENDPOINT".to_string(), "not-an-addr".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("NS_HEALTH_ENDPOINT"))
        );
    }

    #[test]
    fn test_health_path_without_leading_slash_rejected() {
        let vars = HashMap::from([("NS_HEALTH_PATH".to_string(), "health".to_string())]);

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_zero_heartbeat_interval_rejected() {
        let vars = HashMap::from([(
            "NS_HEARTBEAT_INTERVAL_SECONDS".to_string(),
            "0".to_string(),
        )]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("greater than zero"))
        );
    }

    #[test]
    fn test_non_numeric_connection_limit_rejected() {
        let vars = HashMap::from([(
            "NS_MAX_OUTBOUND_CONNECTIONS".to_string(),
            "twelve".to_string(),
        )]);

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_unknown_tls_version_rejected() {
        let vars = HashMap::from([("NS_MIN_TLS_VERSION".to_string(), "1.0".to_string())]);

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let vars = HashMap::from([("NS_LOG_FORMAT".to_string(), "xml".to_string())]);

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
