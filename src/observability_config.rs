//! # Observability Configuration
//!
//! Logging, tracing and metrics settings, sourced from the environment.

use std::env;

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// OTLP endpoint for trace export
    pub otlp_endpoint: Option<String>,
    /// Prometheus metrics endpoint port
    pub metrics_port: u16,
    /// Bind the metrics listener on all interfaces instead of localhost
    pub bind_all_interfaces: bool,
    /// Bearer token required by the metrics listener, if any
    pub metrics_auth_token: Option<String>,
    /// Log level for the gatekeeper crate
    pub log_level: String,
    /// Whether to enable trace sampling
    pub enable_trace_sampling: bool,
    /// Trace sampling ratio (0.0-1.0)
    pub trace_sampling_ratio: f64,
    /// Whether to serve the metrics endpoint at all
    pub enable_metrics_export: bool,
    /// Static labels attached to the startup log line, from `SERVICE_TAGS`
    pub tags: Vec<(String, String)>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            otlp_endpoint: None,
            metrics_port: 9090,
            bind_all_interfaces: false,
            metrics_auth_token: None,
            log_level: "info".to_string(),
            enable_trace_sampling: false,
            trace_sampling_ratio: 1.0,
            enable_metrics_export: true,
            tags: Vec::new(),
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.trim().is_empty()),
            metrics_port: env::var("METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics_port),
            bind_all_interfaces: env::var("METRICS_BIND_ALL_INTERFACES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bind_all_interfaces),
            metrics_auth_token: env::var("METRICS_AUTH_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            log_level: env::var("OBSERVABILITY_LOG_LEVEL").unwrap_or(defaults.log_level),
            enable_trace_sampling: env::var("ENABLE_TRACE_SAMPLING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_trace_sampling),
            trace_sampling_ratio: env::var("TRACE_SAMPLING_RATIO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.trace_sampling_ratio),
            enable_metrics_export: env::var("ENABLE_METRICS_EXPORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_metrics_export),
            tags: env::var("SERVICE_TAGS")
                .map(|raw| parse_tags(&raw))
                .unwrap_or_default(),
        }
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid OTLP endpoint format: {}", endpoint));
            }
        }

        if !(0.0..=1.0).contains(&self.trace_sampling_ratio) {
            return Err(format!("Invalid trace sampling ratio: {}", self.trace_sampling_ratio));
        }

        if self.metrics_port == 0 {
            return Err(format!("Invalid metrics port: {}", self.metrics_port));
        }

        Ok(())
    }
}

/// Parse tags from environment variable string
/// Format: "key1=value1,key2=value2"
pub fn parse_tags(tags_str: &str) -> Vec<(String, String)> {
    tags_str
        .split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.environment, "development");
        assert!(config.is_development());
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.log_level, "info");
        assert!(!config.bind_all_interfaces);
        assert!(config.enable_metrics_export);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ObservabilityConfig::default();
        assert!(config.validate().is_ok());

        config.otlp_endpoint = Some("collector:4317".to_string());
        assert!(config.validate().is_err());
        config.otlp_endpoint = Some("http://collector:4317".to_string());
        assert!(config.validate().is_ok());

        config.trace_sampling_ratio = 1.5;
        assert!(config.validate().is_err());
        config.trace_sampling_ratio = 1.0;

        config.metrics_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tag_parsing() {
        let tags = parse_tags("env=prod, service=gatekeeper,broken,=empty");

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], ("env".to_string(), "prod".to_string()));
        assert_eq!(tags[1], ("service".to_string(), "gatekeeper".to_string()));
    }
}
