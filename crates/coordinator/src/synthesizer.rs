//! Merging agent results into one answer.

use std::collections::BTreeSet;
use std::sync::Arc;

use brain_common::{AgentResult, AgentRole, FinalAnswer};
use brain_llm::{LlmClient, LlmRequest};
use tracing::{debug, info, warn};

pub const NO_INFORMATION_ANSWER: &str =
    "I couldn't find any information to answer that question.";

const SYNTHESIZER_SYSTEM_PROMPT: &str = r#"Synthesize the specialist agent responses into one coherent answer.

- Reconcile the responses into a single clear recommendation.
- Attribute each figure to the agent that reported it (e.g. "Finance reports...", "Marketing reports...").
- Do not introduce figures that no agent reported.
- Be concise but complete."#;

/// Combines agent answers, attributing facts to the agents that produced them.
pub struct Synthesizer {
    llm: Arc<dyn LlmClient>,
    max_tokens: Option<u32>,
}

impl Synthesizer {
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

    /// Produce the final answer for `query`.
    ///
    /// A single result passes through unchanged. Several results are sorted
    /// by role name and reconciled by the capability; if that fails they are
    /// concatenated under role labels. `execution_time_ms` is left for the
    /// caller to fill in.
    pub async fn synthesize(&self, query: &str, mut results: Vec<AgentResult>) -> FinalAnswer {
        let warnings: Vec<String> = results.iter().flat_map(|r| r.warnings.clone()).collect();
        let agents_used: BTreeSet<AgentRole> = results.iter().map(|r| r.role).collect();

        let mut answer = match results.len() {
            0 => FinalAnswer::new(NO_INFORMATION_ANSWER),
            1 => FinalAnswer::new(results.remove(0).answer),
            n => {
                results.sort_by_key(|r| r.role);
                match self.reconcile(query, &results).await {
                    Some(text) => {
                        info!(results = n, "Synthesized combined answer");
                        FinalAnswer::new(text)
                    }
                    None => {
                        let mut fallback = FinalAnswer::new(concatenate(&results));
                        fallback
                            .warnings
                            .push("Answers could not be combined; showing each agent's answer".into());
                        fallback
                    }
                }
            }
        };

        answer.agents_used = agents_used;
        let mut all_warnings = warnings;
        all_warnings.append(&mut answer.warnings);
        answer.warnings = all_warnings;
        answer
    }

    async fn reconcile(&self, query: &str, results: &[AgentResult]) -> Option<String> {
        let responses = results
            .iter()
            .map(|r| format!("{} Agent Response:\n{}", r.role.label(), r.answer))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut request = LlmRequest::new(
            SYNTHESIZER_SYSTEM_PROMPT,
            format!("Original question: {query}\n\nAgent responses:\n\n{responses}\n\nProvide the synthesized answer:"),
        );
        request.temperature = Some(0.3);
        request.max_tokens = self.max_tokens;

        match self.llm.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => {
                debug!(chars = response.content.len(), "Synthesis response");
                Some(response.content)
            }
            Ok(_) => {
                warn!("Empty synthesis response, concatenating answers");
                None
            }
            Err(e) => {
                warn!(error = %e, "Synthesis failed, concatenating answers");
                None
            }
        }
    }
}

/// Each answer under its role label, in the given order.
pub fn concatenate(results: &[AgentResult]) -> String {
    results
        .iter()
        .map(|r| format!("**{}:**\n{}", r.role.label(), r.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_llm::ScriptedClient;

    fn result(role: AgentRole, answer: &str) -> AgentResult {
        AgentResult {
            role,
            answer: answer.to_string(),
            tool_calls: Vec::new(),
            elapsed_ms: 5,
            iterations: 1,
            warnings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_zero_results() {
        let llm = Arc::new(ScriptedClient::new());
        let answer = Synthesizer::new(llm.clone()).synthesize("q", vec![]).await;
        assert_eq!(answer.text, NO_INFORMATION_ANSWER);
        assert!(answer.agents_used.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_result_passes_through() {
        let llm = Arc::new(ScriptedClient::new());
        let answer = Synthesizer::new(llm.clone())
            .synthesize("q", vec![result(AgentRole::Finance, "Revenue was $15,000,000.")])
            .await;
        assert_eq!(answer.text, "Revenue was $15,000,000.");
        assert!(!answer.needs_coordination());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_results_sorted_by_role_before_reconciling() {
        let llm = Arc::new(ScriptedClient::new().reply_text("Combined."));
        let answer = Synthesizer::new(llm.clone())
            .synthesize(
                "Can we afford it?",
                vec![
                    result(AgentRole::Marketing, "ROAS is 3.0x"),
                    result(AgentRole::Finance, "Budget is $4,500,000"),
                ],
            )
            .await;
        assert_eq!(answer.text, "Combined.");
        assert!(answer.needs_coordination());

        let prompt = llm.requests()[0].user_text();
        let finance_at = prompt.find("Finance Agent Response").unwrap();
        let marketing_at = prompt.find("Marketing Agent Response").unwrap();
        assert!(finance_at < marketing_at);
    }

    #[tokio::test]
    async fn test_failure_concatenates_with_warning() {
        let llm = Arc::new(ScriptedClient::new().fail("HTTP 500"));
        let answer = Synthesizer::new(llm)
            .synthesize(
                "q",
                vec![
                    result(AgentRole::Marketing, "ROAS is 3.0x"),
                    result(AgentRole::Finance, "Budget is $4,500,000"),
                ],
            )
            .await;
        assert!(answer.text.starts_with("**Finance:**\nBudget is $4,500,000"));
        assert!(answer.text.contains("**Marketing:**\nROAS is 3.0x"));
        assert_eq!(answer.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_agent_warnings_are_carried() {
        let mut partial = result(AgentRole::Finance, "partial");
        partial.warnings.push("Finance agent stopped after 5 iterations".into());
        let answer = Synthesizer::new(Arc::new(ScriptedClient::new()))
            .synthesize("q", vec![partial])
            .await;
        assert_eq!(answer.warnings, vec!["Finance agent stopped after 5 iterations"]);
    }
}
