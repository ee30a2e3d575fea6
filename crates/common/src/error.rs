//! Error types for CampaignBrain.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrainError {
    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Decomposition error: {0}")]
    Decomposition(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An orchestration invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrainError {
    /// Whether the failure came from the reasoning capability itself
    /// (transport, provider status, or an expired attempt).
    pub fn is_capability_failure(&self) -> bool {
        matches!(self, Self::Capability(_) | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, BrainError>;
