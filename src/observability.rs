//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Optional OpenTelemetry trace export
//! - Prometheus metrics and health endpoints

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use anyhow::Result;

use crate::observability_config::ObservabilityConfig;

pub use self::health_checks::ReadinessState;
pub use self::metrics::{
    record_decision, record_gateway_failure, record_join_request, record_start_command,
    record_verification_prompt,
};
pub use self::tracing_mod::telegram_span;

/// Initialize the complete observability stack with custom configuration
pub async fn init_observability_with_config(
    config: &ObservabilityConfig,
    readiness: ReadinessState,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // Logging first so the remaining steps are visible
    tracing_mod::init_tracing_with_config(config)?;
    tracing_mod::init_opentelemetry_tracing_with_config(config)?;

    if config.enable_metrics_export {
        let metrics_handle = self::metrics::init_metrics_with_config(config)?;
        self::metrics::start_metrics_server(metrics_handle, config, readiness).await?;
    } else {
        tracing::info!("Metrics export disabled");
    }

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_port = %config.metrics_port,
        tags = ?config.tags,
        "Observability stack initialized successfully"
    );
    Ok(())
}
