//! Per-user conversation store.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use brain_common::{Turn, TurnRole};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::retrieval::render_context;
use crate::types::{MemoryConfig, MemoryStats};

/// One user's retained history.
#[derive(Debug, Default)]
pub struct ConversationState {
    turns: VecDeque<Turn>,
    evicted: u64,
}

impl ConversationState {
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append, keeping timestamps strictly increasing and the window bounded.
    fn push(&mut self, mut turn: Turn, max_turns: usize) -> Turn {
        if let Some(last) = self.turns.back() {
            if turn.timestamp <= last.timestamp {
                turn.timestamp = last.timestamp + 1;
            }
        }
        self.turns.push_back(turn.clone());

        while self.turns.len() > max_turns {
            if let Some(evicted) = self.turns.pop_front() {
                self.evicted += 1;
                debug!(timestamp = evicted.timestamp, "Evicted turn from conversation window");
            }
        }
        turn
    }

    fn recent(&self, k: usize) -> Vec<Turn> {
        let skip = self.turns.len().saturating_sub(k);
        self.turns.iter().skip(skip).cloned().collect()
    }
}

type SharedState = Arc<Mutex<ConversationState>>;

/// Conversation histories keyed by user id.
///
/// State is created on first append and destroyed only by [`clear`].
/// Each user's history sits behind its own lock, so concurrent requests for
/// one user serialize their writes while different users never contend
/// beyond the key lookup.
///
/// [`clear`]: ConversationMemory::clear
pub struct ConversationMemory {
    config: MemoryConfig,
    users: RwLock<HashMap<String, SharedState>>,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl ConversationMemory {
    pub fn new(config: MemoryConfig) -> Self {
        info!(max_turns = config.max_turns, "Initializing conversation memory");
        Self {
            config: MemoryConfig {
                max_turns: config.max_turns.max(1),
                ..config
            },
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    fn existing(&self, user_id: &str) -> Option<SharedState> {
        self.users.read().get(user_id).cloned()
    }

    fn get_or_create(&self, user_id: &str) -> SharedState {
        if let Some(state) = self.existing(user_id) {
            return state;
        }
        self.users
            .write()
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id, "Creating conversation state");
                Arc::default()
            })
            .clone()
    }

    /// Append one turn. Returns the turn as stored, with its timestamp
    /// adjusted if it was not later than the previous turn.
    pub async fn append(&self, user_id: &str, turn: Turn) -> Turn {
        let state = self.get_or_create(user_id);
        let mut guard = state.lock().await;
        guard.push(turn, self.config.max_turns)
    }

    /// Append a user turn and its answer under one lock, so concurrent
    /// exchanges for the same user never interleave.
    pub async fn append_exchange(&self, user_id: &str, question: Turn, answer: Turn) {
        let state = self.get_or_create(user_id);
        let mut guard = state.lock().await;
        guard.push(question, self.config.max_turns);
        guard.push(answer, self.config.max_turns);
        debug!(user_id, turns = guard.len(), "Appended exchange");
    }

    /// The last `k` turns, oldest first. Unknown users have no turns.
    pub async fn recent(&self, user_id: &str, k: usize) -> Vec<Turn> {
        match self.existing(user_id) {
            Some(state) => state.lock().await.recent(k),
            None => Vec::new(),
        }
    }

    /// Render the configured number of recent turns for a prompt.
    pub async fn context_string(&self, user_id: &str, turns: usize) -> String {
        let recent = self.recent(user_id, turns).await;
        render_context(&recent, self.config.preview_chars)
    }

    /// Drop a user's history. Returns whether there was any.
    pub async fn clear(&self, user_id: &str) -> bool {
        let removed = self.users.write().remove(user_id);
        match removed {
            Some(state) => {
                let had_turns = !state.lock().await.is_empty();
                info!(user_id, had_turns, "Cleared conversation history");
                had_turns
            }
            None => false,
        }
    }

    /// Retained turns whose content contains `keyword`, case-insensitively.
    pub async fn search(&self, user_id: &str, keyword: &str) -> Vec<Turn> {
        let Some(state) = self.existing(user_id) else {
            return Vec::new();
        };
        let needle = keyword.to_lowercase();
        let guard = state.lock().await;
        guard
            .turns()
            .filter(|t| t.content.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub async fn stats(&self, user_id: &str) -> MemoryStats {
        let mut stats = MemoryStats {
            user_id: user_id.to_string(),
            ..Default::default()
        };
        let Some(state) = self.existing(user_id) else {
            return stats;
        };

        let guard = state.lock().await;
        let mut agents = BTreeMap::new();
        for turn in guard.turns() {
            if turn.role == TurnRole::Assistant {
                stats.total_interactions += 1;
                for role in &turn.agents_used {
                    *agents.entry(*role).or_insert(0) += 1;
                }
            }
        }
        stats.total_turns = guard.len();
        stats.agents_used = agents;
        stats.first_timestamp = guard.turns().next().map(|t| t.timestamp);
        stats.last_timestamp = guard.turns().last().map(|t| t.timestamp);
        stats.evicted_turns = guard.evicted;
        stats
    }

    /// Number of users with live state.
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}
