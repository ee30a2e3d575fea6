//! Conversation memory for CampaignBrain.
//!
//! Each user has an ordered, bounded history of turns. The orchestrator is
//! the only writer: it reads recent turns as context before routing and
//! appends the finished exchange once an answer is produced.
//!
//! ```text
//! ConversationMemory
//!   └─ user_id ──► Mutex<ConversationState>
//!                    └─ VecDeque<Turn>  (oldest evicted beyond max_turns)
//! ```

pub mod retrieval;
pub mod store;
pub mod types;

pub use retrieval::{EMPTY_HISTORY, render_context, truncate};
pub use store::{ConversationMemory, ConversationState};
pub use types::{MemoryConfig, MemoryStats};
