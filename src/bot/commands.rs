//! Command intake for `/start`

use teloxide::types::{ChatId, Message};
use tracing::{debug, Instrument};

use super::verification::{send_verification, PromptOrigin};
use super::HandlerContext;
use crate::errors::error_logging;
use crate::observability;

/// How an incoming message was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Not a `/start` command, or sent from a group or by a bot
    Ignored,
    /// The sender got the verification question for the target chat
    Prompted,
    /// Sending the question failed
    PromptFailed,
}

/// Whether `text` is a `/start` command, with or without `@botname` and payload
pub fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or("");
    match command.strip_prefix("/start") {
        Some("") => true,
        Some(rest) => rest.starts_with('@') && rest.len() > 1,
        None => false,
    }
}

/// Handle a text message; only `/start` in a private chat from a human is acted on
pub async fn handle_message(ctx: &HandlerContext, msg: &Message) -> CommandOutcome {
    let Some(text) = msg.text() else {
        return CommandOutcome::Ignored;
    };
    if !is_start_command(text) {
        return CommandOutcome::Ignored;
    }

    let Some(sender) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring /start without sender");
        observability::record_start_command(false);
        return CommandOutcome::Ignored;
    };

    if sender.is_bot || !msg.chat.is_private() {
        debug!(
            user_id = %sender.id,
            chat_id = %msg.chat.id,
            is_bot = sender.is_bot,
            "Ignoring /start outside a private chat with a human"
        );
        observability::record_start_command(false);
        return CommandOutcome::Ignored;
    }
    observability::record_start_command(true);

    let span = observability::telegram_span("start_command", Some(sender.id.0));
    let target_chat = ChatId(ctx.config.gatekeeper.target_chat_id);

    async {
        match send_verification(ctx, sender, target_chat, PromptOrigin::StartCommand).await {
            Ok(()) => CommandOutcome::Prompted,
            Err(e) => {
                error_logging::log_gateway_error(
                    &e,
                    "send_verification",
                    Some(sender.id.0),
                    Some(target_chat.0),
                );
                observability::record_gateway_failure("send_message");
                CommandOutcome::PromptFailed
            }
        }
    }
    .instrument(span)
    .await
}
