//! # Test Helper Library
//!
//! Common setup for the integration tests: an in-memory recording
//! [`Gateway`] and builders for Telegram updates deserialized from the same
//! JSON shapes the Bot API delivers.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use join_gatekeeper::bot::gateway::{Gateway, GatewayError, GatewayResult};
use join_gatekeeper::bot::HandlerContext;
use join_gatekeeper::config::AppConfig;
use join_gatekeeper::localization::LocalizationManager;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use teloxide::types::{
    CallbackQuery, ChatId, ChatJoinRequest, InlineKeyboardButtonKind, InlineKeyboardMarkup,
    Message, MessageId, UserId,
};

pub const INVITE_LINK: &str = "https://t.me/+single-use";

/// One outbound call observed by [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendMessage {
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    EditMessageText {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    AnswerCallback {
        presser: UserId,
        notice: Option<String>,
    },
    Approve {
        chat_id: ChatId,
        user_id: UserId,
    },
    Decline {
        chat_id: ChatId,
        user_id: UserId,
    },
    CreateInviteLink {
        chat_id: ChatId,
        expire_date: DateTime<Utc>,
        member_limit: u32,
    },
}

/// Errors the recording gateway returns instead of succeeding
#[derive(Debug, Default, Clone)]
pub struct Failures {
    pub send_message: Option<GatewayError>,
    pub edit_message_text: Option<GatewayError>,
    pub answer_callback: Option<GatewayError>,
    pub approve: Option<GatewayError>,
    pub decline: Option<GatewayError>,
    pub create_invite_link: Option<GatewayError>,
}

/// Gateway double that records every call and never touches the network
#[derive(Debug, Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    failures: Failures,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: Failures) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call, failure: &Option<GatewayError>) -> GatewayResult<()> {
        self.calls.lock().push(call);
        match failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn approvals(&self) -> Vec<(ChatId, UserId)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Approve { chat_id, user_id } => Some((chat_id, user_id)),
                _ => None,
            })
            .collect()
    }

    pub fn declines(&self) -> Vec<(ChatId, UserId)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Decline { chat_id, user_id } => Some((chat_id, user_id)),
                _ => None,
            })
            .collect()
    }

    pub fn invite_links(&self) -> Vec<(ChatId, DateTime<Utc>, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateInviteLink {
                    chat_id,
                    expire_date,
                    member_limit,
                } => Some((chat_id, expire_date, member_limit)),
                _ => None,
            })
            .collect()
    }

    pub fn sent_messages(&self) -> Vec<(ChatId, String, Option<InlineKeyboardMarkup>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendMessage {
                    chat_id,
                    text,
                    keyboard,
                } => Some((chat_id, text, keyboard)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(ChatId, MessageId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::EditMessageText {
                    chat_id,
                    message_id,
                    text,
                } => Some((chat_id, message_id, text)),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<(UserId, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AnswerCallback { presser, notice } => Some((presser, notice)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> GatewayResult<()> {
        self.record(
            Call::SendMessage {
                chat_id,
                text,
                keyboard,
            },
            &self.failures.send_message,
        )
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    ) -> GatewayResult<()> {
        self.record(
            Call::EditMessageText {
                chat_id,
                message_id,
                text,
            },
            &self.failures.edit_message_text,
        )
    }

    async fn answer_callback(
        &self,
        query: &CallbackQuery,
        notice: Option<String>,
    ) -> GatewayResult<()> {
        self.record(
            Call::AnswerCallback {
                presser: query.from.id,
                notice,
            },
            &self.failures.answer_callback,
        )
    }

    async fn approve_join_request(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<()> {
        self.record(Call::Approve { chat_id, user_id }, &self.failures.approve)
    }

    async fn decline_join_request(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<()> {
        self.record(Call::Decline { chat_id, user_id }, &self.failures.decline)
    }

    async fn create_invite_link(
        &self,
        chat_id: ChatId,
        expire_date: DateTime<Utc>,
        member_limit: u32,
    ) -> GatewayResult<String> {
        self.record(
            Call::CreateInviteLink {
                chat_id,
                expire_date,
                member_limit,
            },
            &self.failures.create_invite_link,
        )?;
        Ok(INVITE_LINK.to_string())
    }
}

/// Configuration with valid values for every section
pub fn test_config(target_chat_id: i64) -> AppConfig {
    let mut config = AppConfig::default();
    config.bot.token = "123456789:AAFakeTokenForTestingPurposes1234567890".to_string();
    config.gatekeeper.target_chat_id = target_chat_id;
    config.gatekeeper.contact_url = "https://instagram.com/admissions".to_string();
    config
}

/// Handler context wired to `gateway`
pub fn test_context(gateway: Arc<RecordingGateway>, config: AppConfig) -> HandlerContext {
    let localization = Arc::new(
        LocalizationManager::with_default_language("en")
            .expect("Failed to create localization manager"),
    );
    HandlerContext::new(gateway, Arc::new(config), localization)
}

fn user_json(user_id: u64, first_name: &str, is_bot: bool) -> Value {
    json!({
        "id": user_id,
        "is_bot": is_bot,
        "first_name": first_name,
        "language_code": "en"
    })
}

fn private_chat_json(user_id: u64, first_name: &str) -> Value {
    json!({
        "id": user_id,
        "type": "private",
        "first_name": first_name
    })
}

fn group_chat_json(chat_id: i64, kind: &str) -> Value {
    json!({
        "id": chat_id,
        "type": kind,
        "title": "Applicants"
    })
}

/// A join request by `user_id` for the supergroup `chat_id`
pub fn join_request(user_id: u64, chat_id: i64, first_name: &str) -> ChatJoinRequest {
    serde_json::from_value(json!({
        "chat": group_chat_json(chat_id, "supergroup"),
        "from": user_json(user_id, first_name, false),
        "user_chat_id": user_id,
        "date": 1_700_000_000
    }))
    .expect("valid chat join request fixture")
}

/// A text message from `user_id` sent in their private chat with the bot
pub fn private_text_message(user_id: u64, first_name: &str, text: &str) -> Message {
    text_message(
        user_json(user_id, first_name, false),
        private_chat_json(user_id, first_name),
        text,
    )
}

/// A text message from `user_id` sent in the group `chat_id`
pub fn group_text_message(user_id: u64, chat_id: i64, text: &str) -> Message {
    text_message(
        user_json(user_id, "Member", false),
        group_chat_json(chat_id, "group"),
        text,
    )
}

/// A text message sent by another bot in a private chat
pub fn bot_text_message(bot_id: u64, text: &str) -> Message {
    text_message(
        user_json(bot_id, "OtherBot", true),
        private_chat_json(bot_id, "OtherBot"),
        text,
    )
}

fn text_message(from: Value, chat: Value, text: &str) -> Message {
    serde_json::from_value(json!({
        "message_id": 10,
        "date": 1_700_000_000,
        "chat": chat,
        "from": from,
        "text": text
    }))
    .expect("valid message fixture")
}

/// Message id of the prompt carried by [`button_press`] fixtures
pub const PROMPT_MESSAGE_ID: i32 = 42;

/// A press by `presser_id` on a button with `data`, attached to the prompt
/// in `presser_id`'s private chat
pub fn button_press(presser_id: u64, data: &str) -> CallbackQuery {
    serde_json::from_value(json!({
        "id": format!("cbq-{}", presser_id),
        "from": user_json(presser_id, "Presser", false),
        "chat_instance": "instance-1",
        "data": data,
        "message": {
            "message_id": PROMPT_MESSAGE_ID,
            "date": 1_700_000_000,
            "chat": private_chat_json(presser_id, "Presser"),
            "from": user_json(999_000, "GatekeeperBot", true),
            "text": "Hello! Are you an applicant?"
        }
    }))
    .expect("valid callback query fixture")
}

/// A press whose originating message Telegram no longer attaches
pub fn detached_button_press(presser_id: u64, data: &str) -> CallbackQuery {
    serde_json::from_value(json!({
        "id": format!("cbq-detached-{}", presser_id),
        "from": user_json(presser_id, "Presser", false),
        "chat_instance": "instance-2",
        "data": data
    }))
    .expect("valid callback query fixture")
}

/// Callback payloads of a keyboard, row by row
pub fn keyboard_tokens(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
    keyboard
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}
