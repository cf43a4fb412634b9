//! # Decision Tokens
//!
//! The callback payload attached to the yes/no buttons. On the wire it is
//! `"{action}_{user_id}_{chat_id}"`, for example `approve_111_-500`. It is
//! decoded into [`Decision`] as soon as a button press arrives.
//!
//! Only canonical decimal numbers are accepted, so every token that parses
//! re-encodes to exactly the same string.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use teloxide::types::{ChatId, UserId};

lazy_static! {
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"^(approve|decline)_(0|[1-9][0-9]*)_(0|-?[1-9][0-9]*)$")
            .expect("decision token pattern is valid");
}

/// What the pressed button asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionAction {
    Approve,
    Decline,
}

impl DecisionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionAction::Approve => "approve",
            DecisionAction::Decline => "decline",
        }
    }
}

/// A decoded button payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Approve { user_id: UserId, chat_id: ChatId },
    Decline { user_id: UserId, chat_id: ChatId },
}

impl Decision {
    pub fn new(action: DecisionAction, user_id: UserId, chat_id: ChatId) -> Self {
        match action {
            DecisionAction::Approve => Decision::Approve { user_id, chat_id },
            DecisionAction::Decline => Decision::Decline { user_id, chat_id },
        }
    }

    pub fn action(&self) -> DecisionAction {
        match self {
            Decision::Approve { .. } => DecisionAction::Approve,
            Decision::Decline { .. } => DecisionAction::Decline,
        }
    }

    /// The user whose join request this decision is about
    pub fn user_id(&self) -> UserId {
        match *self {
            Decision::Approve { user_id, .. } | Decision::Decline { user_id, .. } => user_id,
        }
    }

    /// The chat the user wants to join
    pub fn chat_id(&self) -> ChatId {
        match *self {
            Decision::Approve { chat_id, .. } | Decision::Decline { chat_id, .. } => chat_id,
        }
    }

    /// Encode into the callback payload format
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.action().as_str(),
            self.user_id().0,
            self.chat_id().0
        )
    }
}

/// Why a callback payload could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenParseError {
    /// The callback query carried no data at all
    Empty,
    /// The payload does not look like `{action}_{user_id}_{chat_id}`
    Malformed(String),
    /// The payload has the right shape but a number does not fit its type
    OutOfRange(String),
}

impl fmt::Display for TokenParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenParseError::Empty => write!(f, "callback payload is empty"),
            TokenParseError::Malformed(raw) => {
                write!(f, "callback payload '{}' is not a decision token", raw)
            }
            TokenParseError::OutOfRange(raw) => {
                write!(f, "callback payload '{}' contains an out-of-range id", raw)
            }
        }
    }
}

impl std::error::Error for TokenParseError {}

impl FromStr for Decision {
    type Err = TokenParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(TokenParseError::Empty);
        }

        let captures = TOKEN_PATTERN
            .captures(raw)
            .ok_or_else(|| TokenParseError::Malformed(raw.to_string()))?;

        let action = match &captures[1] {
            "approve" => DecisionAction::Approve,
            _ => DecisionAction::Decline,
        };
        let user_id: u64 = captures[2]
            .parse()
            .map_err(|_| TokenParseError::OutOfRange(raw.to_string()))?;
        let chat_id: i64 = captures[3]
            .parse()
            .map_err(|_| TokenParseError::OutOfRange(raw.to_string()))?;

        Ok(Decision::new(action, UserId(user_id), ChatId(chat_id)))
    }
}

/// Decode an optional callback payload
pub fn parse_decision(data: Option<&str>) -> Result<Decision, TokenParseError> {
    data.unwrap_or_default().parse()
}
