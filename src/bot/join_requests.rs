//! Chat join request intake

use teloxide::types::ChatJoinRequest;
use tracing::{info, warn, Instrument};

use super::gateway::GatewayError;
use super::verification::{send_verification, PromptOrigin};
use super::HandlerContext;
use crate::errors::error_logging;
use crate::observability;

/// How a join request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRequestOutcome {
    /// The requester got the verification question
    Prompted,
    /// The requester could not be messaged and was approved directly
    AutoApproved,
    /// The requester could not be messaged and the direct approval failed
    AutoApproveFailed,
    /// Sending the question failed for another reason; the request stays pending
    PromptFailed,
}

impl JoinRequestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinRequestOutcome::Prompted => "prompted",
            JoinRequestOutcome::AutoApproved => "auto_approved",
            JoinRequestOutcome::AutoApproveFailed => "auto_approve_failed",
            JoinRequestOutcome::PromptFailed => "prompt_failed",
        }
    }
}

/// Ask the requester the verification question, approving directly when
/// they cannot be reached. A request is never declined here.
pub async fn handle_join_request(
    ctx: &HandlerContext,
    request: &ChatJoinRequest,
) -> JoinRequestOutcome {
    let span = observability::telegram_span("join_request", Some(request.from.id.0));
    async {
        let user_id = request.from.id;
        let chat_id = request.chat.id;

        info!(
            user_id = %user_id,
            chat_id = %chat_id,
            chat_title = ?request.chat.title(),
            "Received chat join request"
        );

        let outcome = match send_verification(ctx, &request.from, chat_id, PromptOrigin::JoinRequest)
            .await
        {
            Ok(()) => JoinRequestOutcome::Prompted,
            Err(GatewayError::Unreachable(reason)) => {
                warn!(
                    user_id = %user_id,
                    chat_id = %chat_id,
                    reason = %reason,
                    "Requester cannot be messaged, approving directly"
                );
                match ctx.gateway.approve_join_request(chat_id, user_id).await {
                    Ok(()) => JoinRequestOutcome::AutoApproved,
                    Err(e) => {
                        error_logging::log_gateway_error(
                            &e,
                            "approve_join_request",
                            Some(user_id.0),
                            Some(chat_id.0),
                        );
                        observability::record_gateway_failure("approve_join_request");
                        JoinRequestOutcome::AutoApproveFailed
                    }
                }
            }
            Err(e) => {
                error_logging::log_gateway_error(
                    &e,
                    "send_verification",
                    Some(user_id.0),
                    Some(chat_id.0),
                );
                observability::record_gateway_failure("send_message");
                JoinRequestOutcome::PromptFailed
            }
        };

        observability::record_join_request(outcome.as_str());
        outcome
    }
    .instrument(span)
    .await
}
