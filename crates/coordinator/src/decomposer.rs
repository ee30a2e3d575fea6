//! Task decomposition for multi-role queries.

use std::str::FromStr;
use std::sync::Arc;

use brain_common::{AgentRole, BrainError, Intent, Result, Subtask, TaskPlan};
use brain_llm::{LlmClient, LlmRequest, parse_structured};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

const DECOMPOSER_SYSTEM_PROMPT: &str = r#"You split business questions into subtasks for specialist agents.

Agents:
- "finance": revenue, expenses, profit margin, budget availability, forecasts
- "marketing": campaign performance, channel comparison, ROAS, CAC

Rules:
- Use only the roles listed for this question, and give each of them at least one subtask.
- Each subtask has a short unique "id", a "role", a self-contained "instruction", and "depends_on":
  ids of earlier subtasks whose answers it needs. Leave "depends_on" empty when the subtasks are independent.
- Prefer independent subtasks; add a dependency only when one answer is genuinely needed to produce another.

Respond ONLY with a JSON object:
{"subtasks": [{"id": "...", "role": "finance|marketing", "instruction": "...", "depends_on": []}]}"#;

#[derive(Debug, Deserialize)]
struct PlanReply {
    subtasks: Vec<RawSubtask>,
}

#[derive(Debug, Deserialize)]
struct RawSubtask {
    id: String,
    role: String,
    instruction: String,
    #[serde(default)]
    depends_on: Vec<String>,
}

fn plan_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "subtasks": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "role": { "type": "string", "enum": ["finance", "marketing"] },
                        "instruction": { "type": "string" },
                        "depends_on": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["id", "role", "instruction", "depends_on"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["subtasks"],
        "additionalProperties": false
    })
}

fn into_subtasks(reply: PlanReply) -> Result<Vec<Subtask>> {
    reply
        .subtasks
        .into_iter()
        .map(|raw| {
            let role = AgentRole::from_str(&raw.role).map_err(|_| {
                BrainError::Decomposition(format!("subtask '{}' has unknown role '{}'", raw.id, raw.role))
            })?;
            Ok(Subtask {
                id: raw.id.trim().to_string(),
                assigned_role: role,
                instruction: raw.instruction,
                depends_on: raw.depends_on.into_iter().map(|d| d.trim().to_string()).collect(),
            })
        })
        .collect()
}

/// Produces validated plans, falling back to one subtask per role.
pub struct Decomposer {
    llm: Arc<dyn LlmClient>,
    max_tokens: Option<u32>,
}

impl Decomposer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Plan `query` for the roles in `intent`. Always returns a valid plan.
    pub async fn decompose(&self, query: &str, intent: &Intent) -> TaskPlan {
        if intent.roles.len() < 2 {
            return TaskPlan::trivial(query, &intent.roles);
        }

        match self.try_decompose(query, intent).await {
            Ok(plan) => {
                info!(subtasks = plan.len(), "Decomposed query");
                plan
            }
            Err(e) => {
                warn!(error = %e, "Decomposition failed, using one subtask per role");
                TaskPlan::trivial(query, &intent.roles)
            }
        }
    }

    /// Ask the capability for a plan and validate it, without fallback.
    pub async fn try_decompose(&self, query: &str, intent: &Intent) -> Result<TaskPlan> {
        let roles = intent
            .roles
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut request = LlmRequest::new(
            DECOMPOSER_SYSTEM_PROMPT,
            format!("Roles for this question: {roles}\n\nQuestion: {query}"),
        )
        .with_schema("task_plan", plan_schema());
        request.temperature = Some(0.0);
        request.max_tokens = self.max_tokens;

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| BrainError::Decomposition(format!("capability failed: {e}")))?;

        let reply: PlanReply = parse_structured(&response.content)
            .map_err(|e| BrainError::Decomposition(format!("unparseable plan: {e}")))?;

        let subtasks = into_subtasks(reply)?;
        debug!(candidate = subtasks.len(), "Validating candidate plan");
        TaskPlan::validate(subtasks, intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_llm::ScriptedClient;

    fn both() -> Intent {
        Intent::new([AgentRole::Finance, AgentRole::Marketing], 0.9)
    }

    fn decomposer(reply: &str) -> Decomposer {
        Decomposer::new(Arc::new(ScriptedClient::new().reply_text(reply)))
    }

    #[tokio::test]
    async fn test_accepts_valid_plan() {
        let plan = decomposer(
            r#"{"subtasks":[
                {"id":"budget","role":"finance","instruction":"Check available budget","depends_on":[]},
                {"id":"roas","role":"marketing","instruction":"Assess ROAS","depends_on":["budget"]}
            ]}"#,
        )
        .decompose("Can we afford to double marketing spend?", &both())
        .await;

        assert_eq!(plan.len(), 2);
        assert!(plan.get("roas").unwrap().depends_on.contains("budget"));
    }

    #[tokio::test]
    async fn test_cycle_falls_back_to_trivial() {
        let plan = decomposer(
            r#"{"subtasks":[
                {"id":"a","role":"finance","instruction":"x","depends_on":["b"]},
                {"id":"b","role":"marketing","instruction":"y","depends_on":["a"]}
            ]}"#,
        )
        .decompose("q", &both())
        .await;

        assert_eq!(plan, TaskPlan::trivial("q", &both().roles));
        assert!(plan.subtasks().iter().all(|s| s.depends_on.is_empty()));
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let err = decomposer(
            r#"{"subtasks":[{"id":"a","role":"legal","instruction":"x","depends_on":[]}]}"#,
        )
        .try_decompose("q", &both())
        .await
        .unwrap_err();
        assert!(matches!(err, BrainError::Decomposition(_)));
    }

    #[tokio::test]
    async fn test_capability_failure_falls_back() {
        let decomposer = Decomposer::new(Arc::new(ScriptedClient::new().fail("timeout")));
        let plan = decomposer.decompose("Can we afford it?", &both()).await;
        assert_eq!(plan.len(), 2);
        assert!(plan.get("finance").unwrap().instruction.contains("budget"));
        assert!(plan.get("marketing").unwrap().instruction.contains("ROAS"));
    }

    #[tokio::test]
    async fn test_single_role_skips_capability() {
        let llm = Arc::new(ScriptedClient::new());
        let decomposer = Decomposer::new(llm.clone());
        let plan = decomposer
            .decompose("Q4 revenue?", &Intent::new([AgentRole::Finance], 0.9))
            .await;
        assert_eq!(plan.subtasks()[0].instruction, "Q4 revenue?");
        assert_eq!(llm.call_count(), 0);
    }
}
