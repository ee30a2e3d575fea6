//! Queries and conversation turns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::role::AgentRole;

/// A user question. Fields are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    user_id: String,
    /// Unix millis
    timestamp: u64,
}

impl Query {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::at(text, user_id, now_millis())
    }

    pub fn at(text: impl Into<String>, user_id: impl Into<String>, timestamp: u64) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            timestamp,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in a user's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default)]
    pub agents_used: BTreeSet<AgentRole>,
    /// Unix millis
    pub timestamp: u64,
}

impl Turn {
    pub fn user(content: impl Into<String>, timestamp: u64) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            agents_used: BTreeSet::new(),
            timestamp,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        agents_used: BTreeSet<AgentRole>,
        timestamp: u64,
    ) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            agents_used,
            timestamp,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}

/// Current wall-clock time in Unix millis.
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
