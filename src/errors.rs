//! # Application Error Types
//!
//! Startup errors. Outbound Telegram failures have their own
//! [`GatewayError`](crate::bot::gateway::GatewayError) and callback payload
//! failures their own [`TokenParseError`](crate::decision_token::TokenParseError);
//! both are only logged, never propagated past a handler.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities
pub mod error_logging {
    use tracing::{error, warn};

    /// Log a failed Telegram API call with the ids it concerned
    pub fn log_gateway_error(
        error: &impl std::fmt::Display,
        operation: &str,
        user_id: Option<u64>,
        chat_id: Option<i64>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            user_id = ?user_id,
            chat_id = ?chat_id,
            "Telegram API call failed"
        );
    }

    /// Log network/communication errors of the metrics listener
    pub fn log_network_error(
        error: &impl std::fmt::Display,
        operation: &str,
        endpoint: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            endpoint = ?endpoint,
            "Network operation failed"
        );
    }

    /// Log rejected user input. Long values are cut to keep log lines bounded.
    pub fn log_validation_error(
        error: &impl std::fmt::Display,
        operation: &str,
        user_id: Option<u64>,
        input_type: &str,
        input_value: Option<&str>,
    ) {
        warn!(
            error = %error,
            operation = %operation,
            user_id = ?user_id,
            input_type = %input_type,
            input_value = ?input_value.map(|v| v.chars().take(100).collect::<String>()),
            "Validation failed"
        );
    }
}
