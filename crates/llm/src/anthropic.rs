use async_trait::async_trait;
use brain_common::BrainError;
use brain_common::Result;
use serde::{Deserialize, Serialize};

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage, ToolInvocation};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContent>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContent {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
    usage: Option<AnthropicUsage>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AnthropicClient {
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            model,
            api_key,
            http_client: reqwest::Client::new(),
        }
    }

    /// Map chat messages onto Anthropic's alternating user/assistant turns.
    ///
    /// Tool results travel as `tool_result` blocks in a user turn, and
    /// consecutive blocks for the same side are merged into one message.
    fn build_messages(request: &LlmRequest) -> Vec<AnthropicMessage> {
        let mut messages: Vec<AnthropicMessage> = Vec::new();

        for msg in request.messages.iter().filter(|m| m.role != Role::System) {
            let (role, blocks) = match msg.role {
                Role::Tool => (
                    "user",
                    vec![AnthropicContent::ToolResult {
                        tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                        content: msg.content.clone(),
                    }],
                ),
                Role::Assistant => {
                    let mut blocks = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(AnthropicContent::Text {
                            text: msg.content.clone(),
                        });
                    }
                    blocks.extend(msg.tool_calls.iter().map(|call| AnthropicContent::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.arguments.clone(),
                    }));
                    ("assistant", blocks)
                }
                _ => (
                    "user",
                    vec![AnthropicContent::Text {
                        text: msg.content.clone(),
                    }],
                ),
            };

            match messages.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => messages.push(AnthropicMessage {
                    role: role.to_string(),
                    content: blocks,
                }),
            }
        }
        messages
    }

    /// Anthropic has no response-format parameter; the schema is stated in
    /// the system prompt instead.
    fn build_system(request: &LlmRequest) -> Option<String> {
        let schema_note = request.response_schema.as_ref().map(|schema| {
            format!(
                "Respond only with a JSON object that conforms to this JSON schema:\n{}",
                schema.schema
            )
        });
        match (request.system_prompt.clone(), schema_note) {
            (Some(system), Some(note)) => Some(format!("{system}\n\n{note}")),
            (system, note) => system.or(note),
        }
    }

    fn build_body(&self, request: &LlmRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            system: Self::build_system(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens.unwrap_or(4096),
            tools: request
                .tools
                .iter()
                .map(|spec| AnthropicTool {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    input_schema: spec.parameters.clone(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = self.build_body(&request);

        let response = self
            .http_client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BrainError::Capability(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(BrainError::Capability(format!(
                "Anthropic API error {status}: {body_text}"
            )));
        }

        let anthropic_response: AnthropicResponse = response.json().await.map_err(|e| {
            BrainError::Capability(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in anthropic_response.content {
            match block {
                AnthropicContent::Text { text } => content.push_str(&text),
                AnthropicContent::ToolUse { id, name, input } => tool_calls.push(ToolInvocation {
                    id,
                    name,
                    arguments: input,
                }),
                AnthropicContent::ToolResult { .. } => {}
            }
        }

        Ok(LlmResponse {
            content,
            model: anthropic_response.model,
            usage: anthropic_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            }),
            finish_reason: anthropic_response.stop_reason,
            tool_calls,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
