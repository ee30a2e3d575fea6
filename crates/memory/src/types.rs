//! Memory configuration and statistics.

use brain_common::AgentRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Turns retained per user; the oldest are evicted first.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Assistant content is clipped to this many characters in rendered context.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

fn default_max_turns() -> usize {
    20
}

fn default_preview_chars() -> usize {
    100
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            preview_chars: default_preview_chars(),
        }
    }
}

/// Summary of one user's retained history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub user_id: String,
    pub total_turns: usize,
    /// Completed question/answer exchanges still retained.
    pub total_interactions: usize,
    /// How many retained answers each agent contributed to.
    pub agents_used: BTreeMap<AgentRole, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<u64>,
    /// Turns dropped by the sliding window since the history was created.
    pub evicted_turns: u64,
}
