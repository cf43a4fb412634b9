//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `gateway`: outbound Telegram calls behind the `Gateway` trait
//! - `verification`: sends the yes/no screening question
//! - `join_requests`: chat join request intake
//! - `commands`: `/start` intake
//! - `decisions`: button presses, approve/decline and the invite link fallback
//! - `ui_builder`: keyboards and terminal texts

pub mod commands;
pub mod decisions;
pub mod gateway;
pub mod join_requests;
pub mod ui_builder;
pub mod verification;

use anyhow::Result;
use std::sync::Arc;
use teloxide::types::{CallbackQuery, ChatJoinRequest, Message};

use crate::config::AppConfig;
use crate::decision_guard::DecisionGuard;
use crate::localization::LocalizationManager;
use gateway::Gateway;

/// Upper bound on remembered button presses
const DECISION_GUARD_CAPACITY: usize = 10_000;

/// Shared dependencies for every handler
#[derive(Clone)]
pub struct HandlerContext {
    pub gateway: Arc<dyn Gateway>,
    pub config: Arc<AppConfig>,
    pub localization: Arc<LocalizationManager>,
    pub guard: Arc<DecisionGuard>,
}

impl HandlerContext {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        config: Arc<AppConfig>,
        localization: Arc<LocalizationManager>,
    ) -> Self {
        let guard = Arc::new(DecisionGuard::new(
            config.gatekeeper.decision_guard_ttl_secs,
            DECISION_GUARD_CAPACITY,
        ));
        Self {
            gateway,
            config,
            localization,
            guard,
        }
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("target_chat_id", &self.config.gatekeeper.target_chat_id)
            .field("localization", &self.localization)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

/// Dispatcher endpoint for `chat_join_request` updates
pub async fn join_request_handler(request: ChatJoinRequest, ctx: HandlerContext) -> Result<()> {
    join_requests::handle_join_request(&ctx, &request).await;
    Ok(())
}

/// Dispatcher endpoint for `message` updates
pub async fn message_handler(msg: Message, ctx: HandlerContext) -> Result<()> {
    commands::handle_message(&ctx, &msg).await;
    Ok(())
}

/// Dispatcher endpoint for `callback_query` updates
pub async fn callback_handler(q: CallbackQuery, ctx: HandlerContext) -> Result<()> {
    decisions::handle_button_press(&ctx, &q).await;
    Ok(())
}
