//! Reasoning capability access for CampaignBrain.
//!
//! Everything above this crate talks to a model through the narrow
//! [`LlmClient`] trait: a request carries a system prompt, messages,
//! optional tool specs and an optional response schema; a response carries
//! text and/or tool invocations.

pub mod anthropic;
pub mod client;
pub mod config;
pub mod mock;
pub mod openai;
pub mod retry;
pub mod structured;

pub use anthropic::AnthropicClient;
pub use client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, ResponseSchema, Role, TokenUsage,
    ToolInvocation, ToolSpec,
};
pub use config::{LlmConfig, SemaphoredClient, build_llm_client, with_call_policy};
pub use mock::{ScriptedClient, tool_call_response};
pub use openai::OpenAiClient;
pub use retry::{CallPolicy, RetryingClient};
pub use structured::{extract_json_object, parse_structured};
