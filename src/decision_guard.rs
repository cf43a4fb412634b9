//! # Decision Guard
//!
//! Remembers which button presses were already acted upon so that a double
//! tap (or a retried callback delivery) does not send a second
//! approve/decline call. Entries live in memory for a fixed window and are
//! lost on restart.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use teloxide::types::{ChatId, MessageId};

use crate::decision_token::Decision;

/// Identifies one press target: the token plus the prompt it was attached to
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct DecisionKey {
    pub payload: String,
    pub prompt: Option<(ChatId, MessageId)>,
}

impl DecisionKey {
    pub fn new(decision: &Decision, prompt: Option<(ChatId, MessageId)>) -> Self {
        Self {
            payload: decision.encode(),
            prompt,
        }
    }
}

/// In-memory one-time-consumption store
#[derive(Debug)]
pub struct DecisionGuard {
    consumed: Mutex<HashMap<DecisionKey, Instant>>,
    ttl: Duration,
    max_entries: usize,
}

impl DecisionGuard {
    /// A zero `ttl_secs` disables the guard: every press is let through
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            consumed: Mutex::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Mark `key` as consumed.
    ///
    /// Returns `true` the first time a key is seen within the window and
    /// `false` for every repeat.
    pub fn try_consume(&self, key: DecisionKey) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let now = Instant::now();
        let mut consumed = self.consumed.lock();
        consumed.retain(|_, seen| now.duration_since(*seen) < self.ttl);

        if consumed.contains_key(&key) {
            return false;
        }

        if consumed.len() >= self.max_entries {
            if let Some(oldest) = consumed
                .iter()
                .min_by_key(|(_, seen)| **seen)
                .map(|(key, _)| key.clone())
            {
                consumed.remove(&oldest);
            }
        }

        consumed.insert(key, now);
        true
    }

}

#[cfg(test)]
impl DecisionGuard {
    /// Number of presses currently remembered
    fn len(&self) -> usize {
        self.consumed.lock().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
