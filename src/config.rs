//! # Unified Application Configuration
//!
//! All settings are read once at startup into a single [`AppConfig`] that is
//! then shared with every handler. Nothing reads the environment after that.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Bot-specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_timeout_secs: 30,
        }
    }
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config("Bot token cannot be empty".to_string()));
        }

        // Telegram bot tokens look like `<numeric bot id>:<secret>`
        let (bot_id, secret) = self.token.split_once(':').ok_or_else(|| {
            AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            )
        })?;

        if secret.contains(':') {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        }

        if bot_id.parse::<u64>().is_err() {
            return Err(AppError::Config(
                "Bot token bot ID must be numeric".to_string(),
            ));
        }

        if secret.len() < 20 {
            return Err(AppError::Config(
                "Bot token appears to be too short. Please verify it's a valid token".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(AppError::Config("HTTP timeout cannot be 0".to_string()));
        }

        if self.http_timeout_secs > 300 {
            return Err(AppError::Config(
                "HTTP timeout cannot be greater than 300 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// Screening workflow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    /// Chat the `/start` flow screens users for
    pub target_chat_id: i64,
    /// Alternate contact channel shown in welcome and rejection texts
    pub contact_url: String,
    /// Lifetime of fallback invite links in seconds
    pub invite_link_ttl_secs: u64,
    /// Window in which a repeated button press is ignored (0 disables the guard)
    pub decision_guard_ttl_secs: u64,
    /// Locale used when the user's language is unknown or unsupported
    pub default_language: String,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            target_chat_id: 0,
            contact_url: String::new(),
            invite_link_ttl_secs: 3600, // 1 hour
            decision_guard_ttl_secs: 300,
            default_language: "en".to_string(),
        }
    }
}

impl GatekeeperConfig {
    /// Validate gatekeeper configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.target_chat_id == 0 {
            return Err(AppError::Config("Target chat ID cannot be 0".to_string()));
        }

        if self.invite_link_ttl_secs < 60 {
            return Err(AppError::Config(
                "Invite link TTL cannot be shorter than 60 seconds".to_string(),
            ));
        }

        if self.invite_link_ttl_secs > 86_400 {
            return Err(AppError::Config(
                "Invite link TTL cannot be longer than 24 hours".to_string(),
            ));
        }

        let contact = self.contact_url.trim();
        if !contact.is_empty()
            && !contact.starts_with("https://")
            && !contact.starts_with("http://")
            && !contact.starts_with('@')
        {
            return Err(AppError::Config(
                "Contact URL must be an http(s) link or a @username".to_string(),
            ));
        }

        if self.default_language.trim().is_empty() {
            return Err(AppError::Config("Default language cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Bot configuration
    pub bot: BotConfig,
    /// Screening workflow configuration
    pub gatekeeper: GatekeeperConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: &str) -> AppResult<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{} must be a valid number", key)))
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        // Load bot configuration
        config.bot.token = env::var("TELEGRAM_BOT_TOKEN").map_err(|_| {
            AppError::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        config.bot.http_timeout_secs = env_or("HTTP_CLIENT_TIMEOUT_SECS", "30")?;

        // Load gatekeeper configuration
        let target_chat_id = env::var("TARGET_CHAT_ID").map_err(|_| {
            AppError::Config("TARGET_CHAT_ID environment variable is required".to_string())
        })?;
        config.gatekeeper.target_chat_id = target_chat_id.trim().parse().map_err(|_| {
            AppError::Config("TARGET_CHAT_ID must be a numeric chat ID".to_string())
        })?;
        config.gatekeeper.contact_url = env::var("CONTACT_URL").unwrap_or_default();
        config.gatekeeper.invite_link_ttl_secs = env_or("INVITE_LINK_TTL_SECS", "3600")?;
        config.gatekeeper.decision_guard_ttl_secs = env_or("DECISION_GUARD_TTL_SECS", "300")?;
        config.gatekeeper.default_language =
            env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "en".to_string());

        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Load configuration from the environment and validate it
    pub fn load() -> AppResult<Self> {
        Self::from_env()?.validated()
    }

    /// Return `self` when every section is valid
    pub fn validated(self) -> AppResult<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.bot.validate()?;
        self.gatekeeper.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: bot_token=[REDACTED], target_chat_id={}, invite_link_ttl_secs={}, decision_guard_ttl_secs={}, metrics_port={}, environment={}",
            self.gatekeeper.target_chat_id,
            self.gatekeeper.invite_link_ttl_secs,
            self.gatekeeper.decision_guard_ttl_secs,
            self.observability.metrics_port,
            self.observability.environment
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOKEN: &str = "123456789:AAFakeTokenForTestingPurposes1234567890";

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.bot.token = VALID_TOKEN.to_string();
        config.gatekeeper.target_chat_id = -1001234567890;
        config
    }

    #[test]
    fn test_bot_config_validation() {
        let mut config = BotConfig::default();

        // Invalid: empty token
        assert!(config.validate().is_err());

        // Invalid: malformed token
        config.token = "invalid-token".to_string();
        assert!(config.validate().is_err());

        // Invalid: too many separators
        config.token = "123:abc:defghijklmnopqrstuvwxyz".to_string();
        assert!(config.validate().is_err());

        // Invalid: short token
        config.token = "123:short".to_string();
        assert!(config.validate().is_err());

        config.token = VALID_TOKEN.to_string();
        assert!(config.validate().is_ok());

        config.http_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.http_timeout_secs = 301;
        assert!(config.validate().is_err());
        config.http_timeout_secs = 30;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gatekeeper_config_validation() {
        let mut config = GatekeeperConfig::default();

        // Invalid: no target chat
        assert!(config.validate().is_err());

        config.target_chat_id = -999;
        assert!(config.validate().is_ok());

        config.invite_link_ttl_secs = 10;
        assert!(config.validate().is_err());
        config.invite_link_ttl_secs = 100_000;
        assert!(config.validate().is_err());
        config.invite_link_ttl_secs = 3600;

        config.contact_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
        config.contact_url = "@admissions_help".to_string();
        assert!(config.validate().is_ok());
        config.contact_url = "https://instagram.com/someone".to_string();
        assert!(config.validate().is_ok());

        // Guard disabled is allowed
        config.decision_guard_ttl_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_validation_and_summary() {
        let config = valid_config();
        assert!(config.validate().is_ok());

        let summary = config.summary();
        assert!(summary.contains("[REDACTED]"));
        assert!(!summary.contains(VALID_TOKEN));
        assert!(summary.contains("-1001234567890"));
    }

    #[test]
    fn test_default_config_is_rejected() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_validated_reports_config_category() {
        let err = AppConfig::default().validated().unwrap_err();
        assert!(err.to_string().starts_with("[CONFIG] "));

        let config = valid_config().validated().unwrap();
        assert_eq!(config.gatekeeper.target_chat_id, -1001234567890);
    }
}
