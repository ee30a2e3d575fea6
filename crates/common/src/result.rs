//! Tool traces, agent results and final answers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::role::AgentRole;

/// A tool invocation requested by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub requested_by: AgentRole,
}

/// Either the tool's value or the reason it produced none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolOutcome {
    Value(serde_json::Value),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn value(tool_name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Value(value),
        }
    }

    pub fn error(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            outcome: ToolOutcome::Error(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Error(_))
    }

    /// JSON text fed back to the capability.
    pub fn render(&self) -> String {
        match &self.outcome {
            ToolOutcome::Value(v) => v.to_string(),
            ToolOutcome::Error(e) => serde_json::json!({ "error": e }).to_string(),
        }
    }
}

/// What one agent produced for one subtask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub role: AgentRole,
    pub answer: String,
    /// Calls in the order the agent issued them.
    pub tool_calls: Vec<(ToolCall, ToolResult)>,
    pub elapsed_ms: u64,
    pub iterations: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AgentResult {
    /// True when the answer is a partial one produced after hitting a limit.
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// The answer returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub text: String,
    pub agents_used: BTreeSet<AgentRole>,
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl FinalAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            agents_used: BTreeSet::new(),
            execution_time_ms: 0,
            warnings: Vec::new(),
        }
    }

    /// More than one agent contributed.
    pub fn needs_coordination(&self) -> bool {
        self.agents_used.len() > 1
    }
}
