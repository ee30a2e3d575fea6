//! Intent routing.
//!
//! The capability labels each query with one of a closed set of labels and
//! may rewrite a follow-up into a standalone question using recent history.
//!
//! # Input hardening
//!
//! - Label validation against a whitelist
//! - Rewrite sanitization to prevent injected instructions reaching agents
//! - Confidence range validation

use std::sync::Arc;

use brain_common::{AgentRole, Intent};
use brain_llm::{LlmClient, LlmRequest, parse_structured};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// Valid labels (whitelist).
const VALID_LABELS: &[&str] = &["finance", "marketing", "both", "unknown"];

/// Maximum length for the standalone rewrite.
const MAX_REWRITE_LENGTH: usize = 2048;

/// Patterns that suggest prompt injection in model output.
const JAILBREAK_PATTERNS: &[&str] = &[
    "ignore previous",
    "ignore all previous",
    "ignore prior",
    "forget previous",
    "forget all",
    "disregard previous",
    "override previous",
    "new instructions",
    "system prompt",
    "you are now",
    "act as if",
    "pretend you are",
    "bypass",
    "jailbreak",
];

const ROUTER_SYSTEM_PROMPT: &str = r#"You are the request router for CampaignBrain, a business Q&A assistant with two specialist agents.

Classify the user's current question into exactly one label:
- "finance": revenue, expenses, profit, margin, budget, forecasting, financial analysis
- "marketing": campaigns, ROAS, CAC, conversions, marketing channels, ad performance
- "both": the question needs financial AND marketing analysis (e.g. whether to change marketing spend)
- "unknown": anything else, or too vague to route

If the question is a follow-up that depends on the conversation history (e.g. "What about Instagram?"),
set "standalone_query" to a self-contained version of the question. Otherwise repeat the question as is.

"confidence" reflects how certain you are (0.0 = guess, 1.0 = certain).

Respond ONLY with a JSON object:
{"label": "finance|marketing|both|unknown", "confidence": 0.0-1.0, "standalone_query": "..."}

Examples:

Question: "What was our Q4 revenue?"
{"label":"finance","confidence":0.95,"standalone_query":"What was our Q4 revenue?"}

Question: "Which channel has the best ROAS?"
{"label":"marketing","confidence":0.93,"standalone_query":"Which channel has the best ROAS?"}

Question: "Can we afford to double marketing spend?"
{"label":"both","confidence":0.9,"standalone_query":"Can we afford to double marketing spend?"}

Question: "Tell me a joke"
{"label":"unknown","confidence":0.9,"standalone_query":"Tell me a joke"}"#;

#[derive(Debug, Deserialize)]
struct RouteReply {
    label: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    standalone_query: Option<String>,
}

fn route_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "label": { "type": "string", "enum": VALID_LABELS },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "standalone_query": { "type": "string" }
        },
        "required": ["label", "confidence", "standalone_query"],
        "additionalProperties": false
    })
}

fn contains_injection_pattern(content: &str) -> Option<&'static str> {
    let lower = content.to_lowercase();
    JAILBREAK_PATTERNS
        .iter()
        .find(|pattern| lower.contains(*pattern))
        .copied()
}

/// Keep a rewrite only if it is short enough and looks like a question,
/// not an instruction to the downstream agents.
fn sanitize_rewrite(rewrite: &str, original: &str) -> String {
    if let Some(pattern) = contains_injection_pattern(rewrite) {
        warn!(pattern, "Potential prompt injection in standalone query, using original");
        return original.to_string();
    }

    if rewrite.chars().count() > MAX_REWRITE_LENGTH {
        warn!(max = MAX_REWRITE_LENGTH, "Standalone query exceeds maximum length, truncating");
        return rewrite.chars().take(MAX_REWRITE_LENGTH).collect();
    }

    rewrite.to_string()
}

fn roles_for_label(label: &str) -> Option<Vec<AgentRole>> {
    match label {
        "finance" => Some(vec![AgentRole::Finance]),
        "marketing" => Some(vec![AgentRole::Marketing]),
        "both" => Some(vec![AgentRole::Finance, AgentRole::Marketing]),
        "unknown" => Some(Vec::new()),
        _ => None,
    }
}

/// Classifies queries into agent roles.
pub struct Router {
    llm: Arc<dyn LlmClient>,
    confidence_threshold: f64,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Router {
    pub fn new(llm: Arc<dyn LlmClient>, confidence_threshold: f64) -> Self {
        Self {
            llm,
            confidence_threshold,
            temperature: Some(0.0),
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Classify `query`, using `recent_context` to resolve follow-ups.
    ///
    /// Never fails: an unusable answer yields the empty intent, and a
    /// capability failure yields the empty intent marked `routing_failed`.
    pub async fn classify(&self, query: &str, recent_context: &str) -> Intent {
        debug!(query_preview = %query.chars().take(50).collect::<String>(), "Routing query");

        let mut request = LlmRequest::new(
            ROUTER_SYSTEM_PROMPT,
            format!("{recent_context}\n\nCurrent question: {query}"),
        )
        .with_schema("route", route_schema());
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Router capability failed, asking for clarification");
                return Intent::failed();
            }
        };

        let reply: RouteReply = match parse_structured(&response.content) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Unparseable routing response");
                return Intent::unroutable();
            }
        };

        self.interpret(reply, query)
    }

    fn interpret(&self, reply: RouteReply, query: &str) -> Intent {
        let label = reply.label.trim().to_lowercase();
        let Some(roles) = roles_for_label(&label) else {
            warn!(invalid_label = %label, "Label outside the closed set");
            return Intent::unroutable();
        };

        let confidence = reply.confidence.clamp(0.0, 1.0);
        if confidence <= self.confidence_threshold {
            info!(
                label = %label,
                confidence,
                threshold = self.confidence_threshold,
                "Confidence at or below threshold, treating as unknown"
            );
            return Intent::new([], confidence);
        }

        let mut intent = Intent::new(roles, confidence);
        if let Some(rewrite) = reply.standalone_query.as_deref().map(str::trim) {
            let rewrite = sanitize_rewrite(rewrite, query);
            if !rewrite.is_empty() && rewrite != query {
                intent = intent.with_resolved_query(rewrite);
            }
        }

        info!(
            label = %label,
            confidence,
            resolved = intent.resolved_query.is_some(),
            "Routing decision"
        );
        intent
    }
}
