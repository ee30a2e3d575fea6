//! Routing intents and task plans.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::error::{BrainError, Result};
use crate::role::AgentRole;

/// Router output for a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Target roles, ordered and without duplicates.
    pub roles: Vec<AgentRole>,
    /// Classifier confidence in [0, 1].
    pub confidence: f64,
    pub requires_decomposition: bool,
    /// Standalone rewrite of a follow-up question, if the router produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_query: Option<String>,
    /// Set when the capability failed rather than answered.
    #[serde(default)]
    pub routing_failed: bool,
}

impl Intent {
    pub fn new(roles: impl IntoIterator<Item = AgentRole>, confidence: f64) -> Self {
        let mut ordered = Vec::new();
        for role in roles {
            if !ordered.contains(&role) {
                ordered.push(role);
            }
        }
        let requires_decomposition = ordered.len() > 1;
        Self {
            roles: ordered,
            confidence: confidence.clamp(0.0, 1.0),
            requires_decomposition,
            resolved_query: None,
            routing_failed: false,
        }
    }

    /// The empty intent: no roles, zero confidence.
    pub fn unroutable() -> Self {
        Self::new([], 0.0)
    }

    /// The empty intent, marked as caused by a capability failure.
    pub fn failed() -> Self {
        Self {
            routing_failed: true,
            ..Self::unroutable()
        }
    }

    pub fn with_resolved_query(mut self, query: impl Into<String>) -> Self {
        self.resolved_query = Some(query.into());
        self
    }

    pub fn is_unroutable(&self) -> bool {
        self.roles.is_empty()
    }

    /// The text agents should work on: the standalone rewrite if present.
    pub fn effective_query<'a>(&'a self, original: &'a str) -> &'a str {
        self.resolved_query.as_deref().unwrap_or(original)
    }
}

/// One node of a task plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub assigned_role: AgentRole,
    pub instruction: String,
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
}

impl Subtask {
    pub fn new(id: impl Into<String>, role: AgentRole, instruction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            assigned_role: role,
            instruction: instruction.into(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn after(mut self, dependency: impl Into<String>) -> Self {
        self.depends_on.insert(dependency.into());
        self
    }
}

/// A validated DAG of subtasks.
///
/// Every dependency refers to a subtask defined earlier in the list, so the
/// list order is always a topological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPlan {
    subtasks: Vec<Subtask>,
}

impl TaskPlan {
    /// Validate a candidate plan against the intent it was produced for.
    pub fn validate(subtasks: Vec<Subtask>, intent: &Intent) -> Result<Self> {
        if subtasks.is_empty() {
            return Err(BrainError::Decomposition("plan has no subtasks".into()));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for subtask in &subtasks {
            if subtask.id.trim().is_empty() {
                return Err(BrainError::Decomposition("subtask with empty id".into()));
            }
            if subtask.instruction.trim().is_empty() {
                return Err(BrainError::Decomposition(format!(
                    "subtask '{}' has an empty instruction",
                    subtask.id
                )));
            }
            if !intent.roles.contains(&subtask.assigned_role) {
                return Err(BrainError::Decomposition(format!(
                    "subtask '{}' targets role '{}' outside the intent",
                    subtask.id, subtask.assigned_role
                )));
            }
            for dep in &subtask.depends_on {
                if !seen.contains(dep.as_str()) {
                    return Err(BrainError::Decomposition(format!(
                        "subtask '{}' depends on '{}' which is not defined before it",
                        subtask.id, dep
                    )));
                }
            }
            if !seen.insert(subtask.id.as_str()) {
                return Err(BrainError::Decomposition(format!(
                    "duplicate subtask id '{}'",
                    subtask.id
                )));
            }
        }

        for role in &intent.roles {
            if !subtasks.iter().any(|s| s.assigned_role == *role) {
                return Err(BrainError::Decomposition(format!(
                    "no subtask covers role '{role}'"
                )));
            }
        }

        Ok(Self { subtasks })
    }

    /// One independent subtask per role.
    ///
    /// A single role receives the query verbatim; several roles each get a
    /// role-focused rephrasing.
    pub fn trivial(query: &str, roles: &[AgentRole]) -> Self {
        let focused = roles.len() > 1;
        let subtasks = roles
            .iter()
            .map(|role| {
                let instruction = if focused {
                    role.focus(query)
                } else {
                    query.to_string()
                };
                Subtask::new(role.as_str(), *role, instruction)
            })
            .collect();
        Self { subtasks }
    }

    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    pub fn len(&self) -> usize {
        self.subtasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtasks.is_empty()
    }

    pub fn roles(&self) -> BTreeSet<AgentRole> {
        self.subtasks.iter().map(|s| s.assigned_role).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }
}
