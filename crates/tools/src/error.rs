//! Tool failures. These never leave the agent loop: they are turned into
//! error tool results the model sees and must account for.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Tool '{tool}' is not available to the {role} agent")]
    NotPermitted { tool: String, role: String },

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    /// Rejected before the handler ran.
    pub fn is_argument_error(&self) -> bool {
        !matches!(self, Self::Execution(_))
    }
}
