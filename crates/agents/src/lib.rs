//! Role-scoped agents for CampaignBrain.
//!
//! An agent owns a role, a system framing and the subset of tools that role
//! may call. [`DomainAgent`] runs the bounded tool-use loop against any
//! [`LlmClient`](brain_llm::LlmClient); [`AgentRoster`] holds one agent per
//! role for the dispatcher.
//!
//! ```text
//!   instruction + context
//!          │
//!          ▼
//!   ┌─────────────┐  tool calls   ┌──────────────┐
//!   │ capability  │──────────────►│ ToolRegistry │
//!   │   (LLM)     │◄──────────────│  (dispatch)  │
//!   └─────────────┘  tool results └──────────────┘
//!          │ no tool calls (or cap reached)
//!          ▼
//!     AgentResult
//! ```

pub mod domain;
pub mod prompts;
pub mod roster;
pub mod traits;

pub use domain::{DEFAULT_MAX_ITERATIONS, DomainAgent};
pub use roster::AgentRoster;
pub use traits::Agent;
