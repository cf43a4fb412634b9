//! Verification prompt sender

use teloxide::types::{ChatId, User};
use tracing::{debug, info};

use super::gateway::{GatewayError, GatewayResult};
use super::ui_builder::{create_verification_keyboard, format_verification_question};
use super::HandlerContext;
use crate::observability;

/// What triggered a verification prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOrigin {
    JoinRequest,
    StartCommand,
}

impl PromptOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptOrigin::JoinRequest => "join_request",
            PromptOrigin::StartCommand => "start_command",
        }
    }
}

/// Send the yes/no question about joining `chat_id` to `recipient`'s private chat.
///
/// `GatewayError::Unreachable` is returned as is so callers can pick a fallback.
pub async fn send_verification(
    ctx: &HandlerContext,
    recipient: &User,
    chat_id: ChatId,
    origin: PromptOrigin,
) -> GatewayResult<()> {
    let language_code = recipient.language_code.as_deref();
    let keyboard =
        create_verification_keyboard(recipient.id, chat_id, language_code, &ctx.localization);
    let question =
        format_verification_question(&recipient.first_name, language_code, &ctx.localization);

    debug!(
        user_id = %recipient.id,
        chat_id = %chat_id,
        origin = origin.as_str(),
        "Sending verification prompt"
    );

    let result = ctx
        .gateway
        .send_message(ChatId::from(recipient.id), question, Some(keyboard))
        .await;

    let label = match &result {
        Ok(()) => {
            info!(user_id = %recipient.id, chat_id = %chat_id, "Verification prompt sent");
            "sent"
        }
        Err(GatewayError::Unreachable(_)) => "unreachable",
        Err(_) => "failed",
    };
    observability::record_verification_prompt(origin.as_str(), label);

    result
}
