//! Decision handler for verification button presses
//!
//! A press is classified before anything is sent to Telegram: malformed
//! payloads fail closed, presses by anyone other than the token's user are
//! rejected, and repeats inside the guard window are ignored. Everything
//! else is acknowledged, transitioned and ends with the buttons removed.

use chrono::Utc;
use std::time::Instant;
use teloxide::types::{CallbackQuery, ChatId, MaybeInaccessibleMessage, MessageId, UserId};
use tracing::{debug, info, warn, Instrument};

use super::gateway::GatewayError;
use super::ui_builder::{
    format_approved_message, format_declined_message, format_invite_link_message,
};
use super::HandlerContext;
use crate::decision_guard::DecisionKey;
use crate::decision_token::{parse_decision, Decision};
use crate::errors::error_logging;
use crate::localization::t_lang;
use crate::observability;

/// Invite links created as an approval fallback admit exactly one user
pub const INVITE_LINK_MEMBER_LIMIT: u32 = 1;

/// Terminal state a button press reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// The pending join request was approved
    Approved,
    /// No pending request existed; a single-use invite link was issued
    ApprovedViaLink,
    /// The pending join request was declined
    Declined,
    /// A Telegram call failed; the user saw an error text
    Errored,
    /// Pressed by someone other than the prompted user
    Rejected,
    /// The payload was not a decision token
    Malformed,
    /// Repeat of an already handled press
    Duplicate,
}

impl DecisionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionOutcome::Approved => "approved",
            DecisionOutcome::ApprovedViaLink => "approved_via_link",
            DecisionOutcome::Declined => "declined",
            DecisionOutcome::Errored => "errored",
            DecisionOutcome::Rejected => "rejected",
            DecisionOutcome::Malformed => "malformed",
            DecisionOutcome::Duplicate => "duplicate",
        }
    }
}

/// The message carrying the pressed keyboard, when Telegram still exposes it
fn prompt_location(q: &CallbackQuery) -> Option<(ChatId, MessageId)> {
    match &q.message {
        Some(MaybeInaccessibleMessage::Regular(msg)) => Some((msg.chat.id, msg.id)),
        _ => None,
    }
}

/// Handle a press on a verification button
pub async fn handle_button_press(ctx: &HandlerContext, q: &CallbackQuery) -> DecisionOutcome {
    let span = observability::telegram_span("decision", Some(q.from.id.0));
    async {
        let start_time = Instant::now();
        let outcome = process_press(ctx, q).await;
        observability::record_decision(outcome.as_str(), start_time.elapsed());
        info!(
            user_id = %q.from.id,
            outcome = outcome.as_str(),
            duration_ms = start_time.elapsed().as_millis(),
            "Button press handled"
        );
        outcome
    }
    .instrument(span)
    .await
}

async fn process_press(ctx: &HandlerContext, q: &CallbackQuery) -> DecisionOutcome {
    let language_code = q.from.language_code.as_deref();
    let prompt = prompt_location(q);

    let decision = match parse_decision(q.data.as_deref()) {
        Ok(decision) => decision,
        Err(e) => {
            error_logging::log_validation_error(
                &e,
                "parse_decision",
                Some(q.from.id.0),
                "callback_data",
                q.data.as_deref(),
            );
            acknowledge(
                ctx,
                q,
                Some(t_lang(&ctx.localization, "stale-button", language_code)),
            )
            .await;
            return DecisionOutcome::Malformed;
        }
    };

    if decision.user_id() != q.from.id {
        warn!(
            presser_id = %q.from.id,
            token_user_id = %decision.user_id(),
            chat_id = %decision.chat_id(),
            "Rejected button press by a different user"
        );
        acknowledge(
            ctx,
            q,
            Some(t_lang(&ctx.localization, "not-your-request", language_code)),
        )
        .await;
        return DecisionOutcome::Rejected;
    }

    if !ctx.guard.try_consume(DecisionKey::new(&decision, prompt)) {
        debug!(
            user_id = %q.from.id,
            token = %decision,
            "Ignoring repeated button press"
        );
        acknowledge(ctx, q, None).await;
        return DecisionOutcome::Duplicate;
    }

    acknowledge(ctx, q, None).await;

    let (outcome, text) = match decision {
        Decision::Approve { user_id, chat_id } => {
            approve(ctx, user_id, chat_id, language_code).await
        }
        Decision::Decline { user_id, chat_id } => {
            decline(ctx, user_id, chat_id, language_code).await
        }
    };

    finish(ctx, q.from.id, prompt, text).await;
    outcome
}

/// Acknowledge the press; failures only get logged
async fn acknowledge(ctx: &HandlerContext, q: &CallbackQuery, notice: Option<String>) {
    if let Err(e) = ctx.gateway.answer_callback(q, notice).await {
        error_logging::log_gateway_error(&e, "answer_callback_query", Some(q.from.id.0), None);
        observability::record_gateway_failure("answer_callback_query");
    }
}

async fn approve(
    ctx: &HandlerContext,
    user_id: UserId,
    chat_id: ChatId,
    language_code: Option<&str>,
) -> (DecisionOutcome, String) {
    match ctx.gateway.approve_join_request(chat_id, user_id).await {
        Ok(()) => {
            info!(user_id = %user_id, chat_id = %chat_id, "Join request approved");
            (
                DecisionOutcome::Approved,
                format_approved_message(
                    &ctx.config.gatekeeper.contact_url,
                    language_code,
                    &ctx.localization,
                ),
            )
        }
        Err(GatewayError::NoPendingRequest(reason)) => {
            info!(
                user_id = %user_id,
                chat_id = %chat_id,
                reason = %reason,
                "No pending join request, issuing an invite link"
            );
            issue_invite_link(ctx, user_id, chat_id, language_code).await
        }
        Err(e) => {
            error_logging::log_gateway_error(
                &e,
                "approve_join_request",
                Some(user_id.0),
                Some(chat_id.0),
            );
            observability::record_gateway_failure("approve_join_request");
            (
                DecisionOutcome::Errored,
                t_lang(&ctx.localization, "decision-error", language_code),
            )
        }
    }
}

async fn issue_invite_link(
    ctx: &HandlerContext,
    user_id: UserId,
    chat_id: ChatId,
    language_code: Option<&str>,
) -> (DecisionOutcome, String) {
    let ttl_secs = ctx.config.gatekeeper.invite_link_ttl_secs;
    let expire_date = Utc::now() + chrono::Duration::seconds(ttl_secs as i64);

    match ctx
        .gateway
        .create_invite_link(chat_id, expire_date, INVITE_LINK_MEMBER_LIMIT)
        .await
    {
        Ok(link) => {
            info!(
                user_id = %user_id,
                chat_id = %chat_id,
                expire_date = %expire_date,
                "Single-use invite link created"
            );
            (
                DecisionOutcome::ApprovedViaLink,
                format_invite_link_message(&link, ttl_secs, language_code, &ctx.localization),
            )
        }
        Err(e) => {
            error_logging::log_gateway_error(
                &e,
                "create_chat_invite_link",
                Some(user_id.0),
                Some(chat_id.0),
            );
            observability::record_gateway_failure("create_chat_invite_link");
            (
                DecisionOutcome::Errored,
                t_lang(&ctx.localization, "invite-link-error", language_code),
            )
        }
    }
}

async fn decline(
    ctx: &HandlerContext,
    user_id: UserId,
    chat_id: ChatId,
    language_code: Option<&str>,
) -> (DecisionOutcome, String) {
    match ctx.gateway.decline_join_request(chat_id, user_id).await {
        Ok(()) => {
            info!(user_id = %user_id, chat_id = %chat_id, "Join request declined");
            (
                DecisionOutcome::Declined,
                format_declined_message(
                    &ctx.config.gatekeeper.contact_url,
                    language_code,
                    &ctx.localization,
                ),
            )
        }
        Err(e) => {
            error_logging::log_gateway_error(
                &e,
                "decline_join_request",
                Some(user_id.0),
                Some(chat_id.0),
            );
            observability::record_gateway_failure("decline_join_request");
            (
                DecisionOutcome::Errored,
                t_lang(&ctx.localization, "decision-error", language_code),
            )
        }
    }
}

/// Replace the prompt with `text`, which drops its keyboard.
/// Without an editable prompt the text goes to the presser's private chat.
async fn finish(
    ctx: &HandlerContext,
    presser: UserId,
    prompt: Option<(ChatId, MessageId)>,
    text: String,
) {
    let (operation, chat_id, result) = match prompt {
        Some((chat_id, message_id)) => (
            "edit_message_text",
            chat_id,
            ctx.gateway.edit_message_text(chat_id, message_id, text).await,
        ),
        None => {
            let chat_id = ChatId::from(presser);
            (
                "send_message",
                chat_id,
                ctx.gateway.send_message(chat_id, text, None).await,
            )
        }
    };

    if let Err(e) = result {
        error_logging::log_gateway_error(&e, operation, Some(presser.0), Some(chat_id.0));
        observability::record_gateway_failure(operation);
    }
}
