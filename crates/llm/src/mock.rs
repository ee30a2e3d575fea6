//! Deterministic stand-ins for the reasoning capability.
//!
//! [`ScriptedClient`] replays queued replies in order, or computes each
//! reply from the request with a closure. Every request is recorded so
//! tests can assert on prompts, tools and schemas that were sent.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use brain_common::{BrainError, Result};
use parking_lot::Mutex;

use crate::client::{LlmClient, LlmRequest, LlmResponse, ToolInvocation};

const MOCK_MODEL: &str = "scripted";

enum Step {
    Reply(LlmResponse),
    Fail(String),
}

type Responder = Box<dyn Fn(&LlmRequest) -> Result<LlmResponse> + Send + Sync>;

pub struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<LlmRequest>>,
    latency: Option<Duration>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: None,
            requests: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Answer every request not covered by the queued script with `f`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&LlmRequest) -> Result<LlmResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(f)),
            ..Self::new()
        }
    }

    pub fn reply(self, response: LlmResponse) -> Self {
        self.script.lock().push_back(Step::Reply(response));
        self
    }

    pub fn reply_text(self, content: impl Into<String>) -> Self {
        self.reply(LlmResponse::text(MOCK_MODEL, content))
    }

    pub fn reply_tool_call(self, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        self.reply(tool_call_response(vec![(name.into(), arguments)]))
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(Step::Fail(message.into()));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

/// A response that asks for the given tools, with generated call ids.
pub fn tool_call_response(calls: Vec<(String, serde_json::Value)>) -> LlmResponse {
    LlmResponse {
        tool_calls: calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, arguments))| ToolInvocation {
                id: format!("call_{i}_{name}"),
                name,
                arguments,
            })
            .collect(),
        finish_reason: Some("tool_calls".to_string()),
        ..LlmResponse::text(MOCK_MODEL, "")
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().push(request.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let step = self.script.lock().pop_front();
        match step {
            Some(Step::Reply(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(BrainError::Capability(message)),
            None => match &self.responder {
                Some(responder) => responder(&request),
                None => Err(BrainError::Capability("script exhausted".to_string())),
            },
        }
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_script_in_order() {
        let client = ScriptedClient::new().reply_text("one").reply_text("two");
        assert_eq!(client.complete(LlmRequest::default()).await.unwrap().content, "one");
        assert_eq!(client.complete(LlmRequest::default()).await.unwrap().content, "two");
        assert!(client.complete(LlmRequest::default()).await.is_err());
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn responder_sees_request() {
        let client = ScriptedClient::from_fn(|req| {
            Ok(LlmResponse::text("m", format!("echo: {}", req.user_text())))
        });
        let response = client
            .complete(LlmRequest::new("sys", "hello"))
            .await
            .unwrap();
        assert_eq!(response.content, "echo: hello");
        assert_eq!(client.requests()[0].system_prompt.as_deref(), Some("sys"));
    }

    #[tokio::test]
    async fn tool_call_replies_have_ids() {
        let client = ScriptedClient::new().reply_tool_call("query_revenue", json!({}));
        let response = client.complete(LlmRequest::default()).await.unwrap();
        assert!(response.has_tool_calls());
        assert_eq!(response.tool_calls[0].name, "query_revenue");
        assert_eq!(response.tool_calls[0].id, "call_0_query_revenue");
    }
}
