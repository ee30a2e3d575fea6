//! The agent seam used by the dispatcher.

use async_trait::async_trait;
use brain_common::{AgentResult, AgentRole, Result, Subtask};

/// A role-scoped worker that answers one subtask at a time.
///
/// Implementations may call tools many times, but `run` returns exactly one
/// result. `Err` means the agent could not produce any answer at all.
#[async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> AgentRole;

    /// Answer `subtask`, with `shared_context` holding outputs of the
    /// subtasks it depends on (empty when there are none).
    async fn run(&self, subtask: &Subtask, shared_context: &str) -> Result<AgentResult>;
}
