//! Health check functionality module.
//!
//! Readiness means the bot token is usable and the update dispatcher has
//! been started.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// State the readiness endpoint inspects
#[derive(Debug, Clone)]
pub struct ReadinessState {
    bot_token: String,
    dispatcher_started: Arc<AtomicBool>,
}

impl ReadinessState {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            dispatcher_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Called by `main` right before the dispatcher starts polling.
    /// Clones share the flag.
    pub fn mark_started(&self) {
        self.dispatcher_started.store(true, Ordering::SeqCst);
    }
}

/// Perform all readiness checks
pub fn perform_readiness_checks(readiness: &ReadinessState) -> Result<()> {
    check_bot_token_health(&readiness.bot_token)?;

    if !readiness.dispatcher_started.load(Ordering::SeqCst) {
        return Err(anyhow!("Update dispatcher has not started yet"));
    }

    Ok(())
}

/// Check that the Telegram bot token is at least well formed.
///
/// No API call is made; an invalid token surfaces as dispatcher errors.
pub fn check_bot_token_health(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(anyhow!("Bot token is empty"));
    }

    if !token.contains(':') {
        return Err(anyhow!("Bot token format is invalid"));
    }

    tracing::debug!("Bot token health check passed");
    Ok(())
}
