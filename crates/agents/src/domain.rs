//! Tool-using agent bound to one role.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use brain_common::{AgentResult, AgentRole, BrainError, Result, Subtask, ToolCall, ToolOutcome, ToolResult};
use brain_llm::{ChatMessage, LlmClient, LlmRequest, ToolInvocation};
use brain_tools::{Tool, ToolRegistry, tools_for};
use tracing::{debug, info, warn};

use crate::prompts::system_prompt;
use crate::traits::Agent;

pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// An agent that answers by calling its role's tools in a bounded loop.
///
/// Each iteration sends the conversation so far plus the tool schemas.
/// Requested tool calls are dispatched in order and their results appended
/// as tool messages; a reply without tool calls ends the loop. When the cap
/// is reached the agent returns its best partial answer with a warning.
pub struct DomainAgent {
    role: AgentRole,
    system_prompt: String,
    tools: Vec<Tool>,
    registry: ToolRegistry,
    llm: Arc<dyn LlmClient>,
    max_iterations: u32,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl DomainAgent {
    pub fn new(role: AgentRole, llm: Arc<dyn LlmClient>, registry: ToolRegistry) -> Self {
        Self {
            role,
            system_prompt: system_prompt(role).to_string(),
            tools: tools_for(role),
            registry,
            llm,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn finance(llm: Arc<dyn LlmClient>, registry: ToolRegistry) -> Self {
        Self::new(AgentRole::Finance, llm, registry)
    }

    pub fn marketing(llm: Arc<dyn LlmClient>, registry: ToolRegistry) -> Self {
        Self::new(AgentRole::Marketing, llm, registry)
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    fn initial_request(&self, subtask: &Subtask, shared_context: &str) -> LlmRequest {
        let content = if shared_context.trim().is_empty() {
            subtask.instruction.clone()
        } else {
            format!("{}\n\n{}", subtask.instruction, shared_context)
        };

        LlmRequest {
            system_prompt: Some(self.system_prompt.clone()),
            messages: vec![ChatMessage::user(content)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: ToolRegistry::specs(&self.tools),
            response_schema: None,
        }
    }
}

#[async_trait]
impl Agent for DomainAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    async fn run(&self, subtask: &Subtask, shared_context: &str) -> Result<AgentResult> {
        info!(
            agent = %self.role,
            subtask = %subtask.id,
            "Processing subtask"
        );

        let start = Instant::now();
        let mut request = self.initial_request(subtask, shared_context);
        let mut trace: Vec<(ToolCall, ToolResult)> = Vec::new();
        let mut last_text: Option<String> = None;

        for iteration in 1..=self.max_iterations {
            let response = self.llm.complete(request.clone()).await.map_err(|e| {
                warn!(agent = %self.role, iteration, error = %e, "Capability failed inside tool loop");
                BrainError::Agent(format!("{} agent failed: {e}", self.role.label()))
            })?;

            if !response.has_tool_calls() {
                let answer = if response.content.trim().is_empty() {
                    last_text.take().unwrap_or_else(|| digest(&trace))
                } else {
                    response.content
                };
                info!(
                    agent = %self.role,
                    iterations = iteration,
                    tool_calls = trace.len(),
                    "Subtask complete"
                );
                return Ok(AgentResult {
                    role: self.role,
                    answer,
                    tool_calls: trace,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    iterations: iteration,
                    warnings: Vec::new(),
                });
            }

            if !response.content.trim().is_empty() {
                last_text = Some(response.content.clone());
            }
            request.messages.push(ChatMessage::assistant_with_tools(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for ToolInvocation { id, name, arguments } in response.tool_calls {
                debug!(agent = %self.role, tool = %name, %arguments, "Dispatching tool call");
                let call = ToolCall {
                    tool_name: name,
                    arguments,
                    requested_by: self.role,
                };
                let result = self.registry.dispatch(&call, &self.tools);
                request.messages.push(ChatMessage::tool(id, result.render()));
                trace.push((call, result));
            }
        }

        warn!(
            agent = %self.role,
            max_iterations = self.max_iterations,
            tool_calls = trace.len(),
            "Iteration limit reached, returning partial answer"
        );
        let answer = last_text.unwrap_or_else(|| digest(&trace));
        Ok(AgentResult {
            role: self.role,
            answer,
            tool_calls: trace,
            elapsed_ms: start.elapsed().as_millis() as u64,
            iterations: self.max_iterations,
            warnings: vec![format!(
                "{} agent stopped after {} iterations; the answer may be incomplete",
                self.role.label(),
                self.max_iterations
            )],
        })
    }
}

/// Summary of the successful tool results, used when the model gave no text.
fn digest(trace: &[(ToolCall, ToolResult)]) -> String {
    let lines: Vec<String> = trace
        .iter()
        .filter_map(|(_, result)| match &result.outcome {
            ToolOutcome::Value(v) => Some(format!("- {}: {}", result.tool_name, v)),
            ToolOutcome::Error(_) => None,
        })
        .collect();

    if lines.is_empty() {
        "No answer could be produced.".to_string()
    } else {
        format!("Data gathered so far:\n{}", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_llm::ScriptedClient;
    use serde_json::json;

    fn subtask(role: AgentRole, instruction: &str) -> Subtask {
        Subtask::new(role.as_str(), role, instruction)
    }

    #[test]
    fn digest_skips_errors() {
        let call = ToolCall {
            tool_name: "query_revenue".into(),
            arguments: json!({}),
            requested_by: AgentRole::Finance,
        };
        let trace = vec![
            (call.clone(), ToolResult::value("query_revenue", json!({"revenue": 15000000}))),
            (call, ToolResult::error("query_revenue", "No data found for specified period")),
        ];
        let text = digest(&trace);
        assert!(text.contains("15000000"));
        assert!(!text.contains("No data found"));
    }

    #[test]
    fn digest_of_nothing() {
        assert_eq!(digest(&[]), "No answer could be produced.");
    }

    #[tokio::test]
    async fn context_is_appended_to_instruction() {
        let llm = Arc::new(ScriptedClient::new().reply_text("ok"));
        let agent = DomainAgent::marketing(llm.clone(), ToolRegistry::default());
        agent
            .run(
                &subtask(AgentRole::Marketing, "Assess ROAS"),
                "--- Previous Agent Output ---\nBudget is $4.5M",
            )
            .await
            .unwrap();

        let sent = llm.requests()[0].user_text();
        assert!(sent.starts_with("Assess ROAS"));
        assert!(sent.contains("Budget is $4.5M"));
    }

    #[tokio::test]
    async fn only_role_tools_are_offered() {
        let llm = Arc::new(ScriptedClient::new().reply_text("ok"));
        let agent = DomainAgent::finance(llm.clone(), ToolRegistry::default());
        agent
            .run(&subtask(AgentRole::Finance, "Revenue?"), "")
            .await
            .unwrap();

        let names: Vec<String> = llm.requests()[0]
            .tools
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert!(names.contains(&"query_revenue".to_string()));
        assert!(!names.contains(&"compare_channels".to_string()));
    }

    #[test]
    fn zero_iterations_is_raised_to_one() {
        let agent = DomainAgent::finance(Arc::new(ScriptedClient::new()), ToolRegistry::default())
            .with_max_iterations(0);
        assert_eq!(agent.max_iterations(), 1);
    }
}
