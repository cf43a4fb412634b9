//! Gateway module: the outbound side of the Telegram Bot API
//!
//! Handlers talk to Telegram only through the [`Gateway`] trait so that the
//! screening flow can be exercised without a network. Raw
//! [`RequestError`]s are classified into [`GatewayError`] right here, which
//! is the only place that knows how Telegram words its failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, InlineKeyboardMarkup, MessageId, UserId};
use teloxide::{ApiError, RequestError};

/// Fragments Telegram uses when a join request cannot be acted upon because
/// there is none pending (the user never asked, or is already a member).
const MISSING_JOIN_REQUEST_MARKERS: &[&str] = &[
    "user_already_participant",
    "hide_requester_missing",
    "already a member",
    "already a participant",
    "request not found",
    "join request not found",
];

/// Classified failure of an outbound Telegram call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The recipient blocked the bot or never opened a private chat with it
    Unreachable(String),
    /// There is no pending join request for the user in that chat
    NoPendingRequest(String),
    /// Any other answer from the Bot API (permissions, rate limits, ...)
    Api(String),
    /// The request never produced an API answer
    Network(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unreachable(msg) => write!(f, "recipient unreachable: {}", msg),
            GatewayError::NoPendingRequest(msg) => write!(f, "no pending join request: {}", msg),
            GatewayError::Api(msg) => write!(f, "telegram api error: {}", msg),
            GatewayError::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<RequestError> for GatewayError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(api_error) => classify_api_error(&api_error),
            other => GatewayError::Network(other.to_string()),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Whether a Telegram error description means "no pending join request".
///
/// Telegram has no error code for this, so the check is a case-insensitive
/// match against the descriptions it is known to return.
pub fn indicates_missing_join_request(description: &str) -> bool {
    let description = description.to_lowercase();
    MISSING_JOIN_REQUEST_MARKERS
        .iter()
        .any(|marker| description.contains(marker))
}

fn classify_api_error(api_error: &ApiError) -> GatewayError {
    let description = match api_error {
        ApiError::Unknown(raw) => raw.clone(),
        known => known.to_string(),
    };
    match api_error {
        ApiError::BotBlocked
        | ApiError::CantInitiateConversation
        | ApiError::CantTalkWithBots
        | ApiError::UserDeactivated => GatewayError::Unreachable(description),
        _ if indicates_missing_join_request(&description) => {
            GatewayError::NoPendingRequest(description)
        }
        _ if description.to_lowercase().starts_with("forbidden") => {
            GatewayError::Unreachable(description)
        }
        _ => GatewayError::Api(description),
    }
}

/// Outbound operations the gatekeeper needs from Telegram
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send a message, optionally with an inline keyboard
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> GatewayResult<()>;

    /// Replace a message's text. The inline keyboard is dropped.
    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    ) -> GatewayResult<()>;

    /// Answer a callback query, optionally with an alert shown to the presser
    async fn answer_callback(
        &self,
        query: &CallbackQuery,
        notice: Option<String>,
    ) -> GatewayResult<()>;

    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<()>;

    async fn decline_join_request(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<()>;

    /// Create an invite link and return its URL
    async fn create_invite_link(
        &self,
        chat_id: ChatId,
        expire_date: DateTime<Utc>,
        member_limit: u32,
    ) -> GatewayResult<String>;
}

/// [`Gateway`] backed by a live `teloxide` bot
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> GatewayResult<()> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        request.await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    ) -> GatewayResult<()> {
        self.bot
            .edit_message_text(chat_id, message_id, text)
            .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        query: &CallbackQuery,
        notice: Option<String>,
    ) -> GatewayResult<()> {
        let mut request = self.bot.answer_callback_query(query.id.clone());
        if let Some(notice) = notice {
            request = request.text(notice).show_alert(true);
        }
        request.await?;
        Ok(())
    }

    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<()> {
        self.bot.approve_chat_join_request(chat_id, user_id).await?;
        Ok(())
    }

    async fn decline_join_request(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<()> {
        self.bot.decline_chat_join_request(chat_id, user_id).await?;
        Ok(())
    }

    async fn create_invite_link(
        &self,
        chat_id: ChatId,
        expire_date: DateTime<Utc>,
        member_limit: u32,
    ) -> GatewayResult<String> {
        let link = self
            .bot
            .create_chat_invite_link(chat_id)
            .expire_date(expire_date)
            .member_limit(member_limit)
            .await?;
        Ok(link.invite_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_join_request_predicate() {
        assert!(indicates_missing_join_request(
            "Bad Request: USER_ALREADY_PARTICIPANT"
        ));
        assert!(indicates_missing_join_request("Bad Request: HIDE_REQUESTER_MISSING"));
        assert!(indicates_missing_join_request("User is already a member of the chat"));
        assert!(indicates_missing_join_request("Join Request Not Found"));
        assert!(!indicates_missing_join_request(
            "Bad Request: not enough rights to manage join requests"
        ));
        assert!(!indicates_missing_join_request(""));
    }

    #[test]
    fn test_blocked_user_is_unreachable() {
        let err = GatewayError::from(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(err, GatewayError::Unreachable(_)));

        let err = GatewayError::from(RequestError::Api(ApiError::CantInitiateConversation));
        assert!(matches!(err, GatewayError::Unreachable(_)));
    }

    #[test]
    fn test_unknown_forbidden_is_unreachable() {
        let err = GatewayError::from(RequestError::Api(ApiError::Unknown(
            "Forbidden: bot can't initiate conversation with a user".to_string(),
        )));
        assert!(matches!(err, GatewayError::Unreachable(_)));
    }

    #[test]
    fn test_missing_request_classification() {
        let err = GatewayError::from(RequestError::Api(ApiError::Unknown(
            "Bad Request: HIDE_REQUESTER_MISSING".to_string(),
        )));
        assert!(matches!(err, GatewayError::NoPendingRequest(_)));
    }

    #[test]
    fn test_other_api_errors_are_generic() {
        let err = GatewayError::from(RequestError::Api(ApiError::Unknown(
            "Bad Request: CHAT_ADMIN_REQUIRED".to_string(),
        )));
        assert_eq!(
            err,
            GatewayError::Api("Bad Request: CHAT_ADMIN_REQUIRED".to_string())
        );
    }
}
