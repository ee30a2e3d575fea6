//! Agent roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BrainError;

/// A specialist role a query can be routed to.
///
/// Ordering follows the lowercase role name, which is also the order the
/// synthesizer presents agent results in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Revenue, expenses, margins, budget and forecasts.
    Finance,
    /// Campaign performance, channels, ROAS and acquisition cost.
    Marketing,
}

impl AgentRole {
    pub const ALL: [AgentRole; 2] = [AgentRole::Finance, AgentRole::Marketing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finance => "finance",
            Self::Marketing => "marketing",
        }
    }

    /// Human-facing label used when attributing answers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Finance => "Finance",
            Self::Marketing => "Marketing",
        }
    }

    /// Rephrase a query so it targets this role's part of a combined question.
    pub fn focus(&self, query: &str) -> String {
        match self {
            Self::Finance => format!(
                "From a financial perspective, check the available budget, revenue, \
                 expenses and margins relevant to this question: {query}"
            ),
            Self::Marketing => format!(
                "From a marketing perspective, assess campaign performance, ROAS and ROI \
                 relevant to this question: {query}"
            ),
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "finance" | "cfo" => Ok(Self::Finance),
            "marketing" | "cro" => Ok(Self::Marketing),
            other => Err(BrainError::Routing(format!("Unknown agent role: {other}"))),
        }
    }
}
