//! Common types shared across CampaignBrain crates.
//!
//! This crate holds the data model every stage of a request passes along:
//! queries and turns, routing intents, task plans, tool traces, agent
//! results and final answers.

pub mod conversation;
pub mod error;
pub mod plan;
pub mod result;
pub mod role;

pub use conversation::{Query, Turn, TurnRole, now_millis};
pub use error::{BrainError, Result};
pub use plan::{Intent, Subtask, TaskPlan};
pub use result::{AgentResult, FinalAnswer, ToolCall, ToolOutcome, ToolResult};
pub use role::AgentRole;
