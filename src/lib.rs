//! # Join Gatekeeper Telegram Bot
//!
//! A Telegram bot that screens users joining a restricted chat with a
//! yes/no question and approves or declines their join requests, issuing
//! a single-use invite link when no request is pending.

pub mod bot;
pub mod config;
pub mod decision_guard;
pub mod decision_token;
pub mod errors;
pub mod localization;
pub mod observability;
pub mod observability_config;

// Re-export types for easier access
pub use bot::decisions::DecisionOutcome;
pub use bot::gateway::{Gateway, GatewayError, TelegramGateway};
pub use bot::HandlerContext;
pub use config::AppConfig;
pub use decision_token::{Decision, DecisionAction, TokenParseError};
