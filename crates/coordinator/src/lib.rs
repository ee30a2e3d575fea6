//! The CampaignBrain orchestration engine.
//!
//! The coordinator turns a user question into an answer:
//! 1. Reads recent conversation turns for the user
//! 2. Routes the question to finance, marketing, both, or clarification
//! 3. Decomposes multi-role questions into a dependency-ordered plan
//! 4. Dispatches subtasks to role-scoped agents, concurrently where possible
//! 5. Synthesizes one attributed answer and records the exchange
//!
//! Recurring questions can skip steps 2 and 3 with a prebuilt [`Workflow`].
//!
//! # Architecture
//!
//! ```text
//! Query
//!   │
//!   ▼
//! ┌──────────────┐   recent turns   ┌────────────────────┐
//! │ Orchestrator │◄────────────────►│ ConversationMemory │
//! └──────┬───────┘                  └────────────────────┘
//!        │ Router ─► Decomposer ─► dispatch ─► Synthesizer
//!    ┌───┴────────────┐
//!    ▼                ▼
//! [Finance]      [Marketing]
//!   Agent           Agent
//! ```

pub mod config;
pub mod decomposer;
pub mod dispatch;
pub mod orchestrator;
pub mod router;
pub mod synthesizer;
pub mod workflows;

pub use config::{AgentsConfig, CoordinatorConfig, RouterConfig};
pub use decomposer::Decomposer;
pub use dispatch::{DispatchOutcome, SubtaskFailure, dispatch};
pub use orchestrator::{
    APOLOGY_ANSWER, CLARIFICATION_ANSWER, Orchestrator, OrchestratorState, Outcome, StateTrail,
};
pub use router::Router;
pub use synthesizer::{NO_INFORMATION_ANSWER, Synthesizer};
pub use workflows::Workflow;
