//! The request pipeline.
//!
//! ```text
//! RECEIVED ─► ROUTED ─┬─────────────────────────► COMPLETE   (clarification)
//!                     ├─► DECOMPOSED ─┐
//!                     └───────────────┴─► DISPATCHED ─► SYNTHESIZED ─► COMPLETE
//!
//! any non-terminal state ─► ERROR   (apology, memory untouched)
//! ROUTED ─► ERROR                    (router unavailable: clarification
//!                                     with a warning, memory untouched)
//!
//! Workflows start from a prebuilt plan:
//! RECEIVED ─► DECOMPOSED ─► DISPATCHED ─► SYNTHESIZED ─► COMPLETE
//! ```

use std::sync::Arc;
use std::time::Instant;

use brain_agents::AgentRoster;
use brain_common::{BrainError, FinalAnswer, Intent, Query, Result, TaskPlan, Turn, now_millis};
use brain_llm::{LlmClient, build_llm_client, with_call_policy};
use brain_memory::ConversationMemory;
use brain_tools::ToolRegistry;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::decomposer::Decomposer;
use crate::dispatch::dispatch;
use crate::router::Router;
use crate::synthesizer::Synthesizer;
use crate::workflows::Workflow;

pub const CLARIFICATION_ANSWER: &str = "I'm not sure which area your question is about. \
Could you clarify whether it concerns finance (revenue, expenses, budget, forecasts) \
or marketing (campaigns, channels, ROAS, acquisition cost)?";

pub const APOLOGY_ANSWER: &str =
    "I'm sorry, I wasn't able to answer that question. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestratorState {
    Received,
    Routed,
    Decomposed,
    Dispatched,
    Synthesized,
    Complete,
    Error,
}

impl OrchestratorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use OrchestratorState::*;
        match (self, next) {
            (from, Error) => !from.is_terminal(),
            (Received, Routed)
            | (Received, Decomposed)
            | (Routed, Decomposed)
            | (Routed, Dispatched)
            | (Routed, Complete)
            | (Decomposed, Dispatched)
            | (Dispatched, Synthesized)
            | (Synthesized, Complete) => true,
            _ => false,
        }
    }
}

/// The states one request has visited, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTrail {
    visited: Vec<OrchestratorState>,
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTrail {
    pub fn new() -> Self {
        Self {
            visited: vec![OrchestratorState::Received],
        }
    }

    pub fn current(&self) -> OrchestratorState {
        self.visited
            .last()
            .copied()
            .unwrap_or(OrchestratorState::Received)
    }

    pub fn advance(&mut self, next: OrchestratorState) -> Result<()> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(BrainError::Internal(format!(
                "invalid transition {current:?} -> {next:?}"
            )));
        }
        debug!(from = ?current, to = ?next, "State transition");
        self.visited.push(next);
        Ok(())
    }

    /// Move to ERROR unless already terminal.
    pub fn fail(&mut self) {
        if !self.current().is_terminal() {
            self.visited.push(OrchestratorState::Error);
        }
    }

    pub fn visited(&self) -> &[OrchestratorState] {
        &self.visited
    }
}

/// Result of processing one query.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub request_id: String,
    pub answer: FinalAnswer,
    pub intent: Intent,
    pub states: StateTrail,
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        self.states.current() == OrchestratorState::Error
    }
}

/// Memory → Router → (Decomposer) → agents → Synthesizer → Memory.
///
/// Every component shares one capability handle, wrapped once in the
/// configured call policy and concurrency cap.
pub struct Orchestrator {
    config: CoordinatorConfig,
    memory: Arc<ConversationMemory>,
    router: Router,
    decomposer: Decomposer,
    roster: AgentRoster,
    synthesizer: Synthesizer,
}

impl Orchestrator {
    /// Build every component over `llm`, which is wrapped in the call policy
    /// and the concurrency cap.
    pub fn new(config: CoordinatorConfig, llm: Arc<dyn LlmClient>) -> Self {
        info!(
            model = %llm.model_name(),
            threshold = config.router.confidence_threshold,
            max_iterations = config.agents.max_iterations,
            "Initializing orchestrator"
        );

        let llm = with_call_policy(llm, &config.provider);
        let max_tokens = config.provider.max_tokens;

        let router = Router::new(Arc::clone(&llm), config.router.confidence_threshold)
            .with_max_tokens(max_tokens);
        let decomposer = Decomposer::new(Arc::clone(&llm)).with_max_tokens(max_tokens);
        let synthesizer = Synthesizer::new(Arc::clone(&llm)).with_max_tokens(max_tokens);
        let roster = AgentRoster::standard(
            llm,
            ToolRegistry::default(),
            config.agents.max_iterations,
            config.provider.temperature,
            max_tokens,
        );
        let memory = Arc::new(ConversationMemory::new(config.memory.clone()));

        Self {
            config,
            memory,
            router,
            decomposer,
            roster,
            synthesizer,
        }
    }

    /// Build the provider client described by `config.provider`.
    pub fn from_config(config: CoordinatorConfig) -> Result<Self> {
        let llm = build_llm_client(&config.provider)?;
        Ok(Self::new(config, llm))
    }

    pub fn with_memory(mut self, memory: Arc<ConversationMemory>) -> Self {
        self.memory = memory;
        self
    }

    /// Replace the agents, e.g. to bind a different dataset.
    pub fn with_roster(mut self, roster: AgentRoster) -> Self {
        self.roster = roster;
        self
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Answer `query`. Always produces an answer; failures become the
    /// apology text with the trail ending in ERROR. A router outage also
    /// ends in ERROR but answers with the clarification.
    #[instrument(skip(self, query), fields(user_id = %query.user_id()))]
    pub async fn process(&self, query: &Query) -> Outcome {
        let start = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let mut states = StateTrail::new();
        let mut intent = Intent::unroutable();

        info!(
            request_id = %request_id,
            query_preview = %query.text().chars().take(50).collect::<String>(),
            "Processing query"
        );

        let mut answer = match self.drive(query, &mut states, &mut intent).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(request_id = %request_id, state = ?states.current(), error = %e, "Request failed");
                states.fail();
                FinalAnswer::new(APOLOGY_ANSWER)
            }
        };
        answer.execution_time_ms = start.elapsed().as_millis() as u64;

        info!(
            request_id = %request_id,
            agents = ?answer.agents_used,
            elapsed_ms = answer.execution_time_ms,
            final_state = ?states.current(),
            "Query processed"
        );

        Outcome {
            request_id,
            answer,
            intent,
            states,
        }
    }

    /// Run a prebuilt workflow for `user_id`.
    ///
    /// Fails only when the workflow's arguments are unusable; at runtime it
    /// behaves like [`process`](Self::process) without the routing step, and
    /// the exchange is remembered under [`Workflow::question`].
    #[instrument(skip(self, workflow), fields(workflow = workflow.name()))]
    pub async fn run_workflow(&self, workflow: &Workflow, user_id: &str) -> Result<Outcome> {
        let plan = workflow.plan()?;
        let start = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let query = Query::new(workflow.question(), user_id);
        let mut states = StateTrail::new();

        info!(
            request_id = %request_id,
            user_id = %user_id,
            subtasks = plan.len(),
            "Running workflow"
        );

        let mut answer = match self.drive_plan(&query, &plan, &mut states).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(request_id = %request_id, state = ?states.current(), error = %e, "Workflow failed");
                states.fail();
                FinalAnswer::new(APOLOGY_ANSWER)
            }
        };
        answer.execution_time_ms = start.elapsed().as_millis() as u64;

        info!(
            request_id = %request_id,
            agents = ?answer.agents_used,
            elapsed_ms = answer.execution_time_ms,
            final_state = ?states.current(),
            "Workflow processed"
        );

        Ok(Outcome {
            request_id,
            answer,
            intent: workflow.intent(),
            states,
        })
    }

    async fn drive(
        &self,
        query: &Query,
        states: &mut StateTrail,
        intent_out: &mut Intent,
    ) -> Result<FinalAnswer> {
        let user_id = query.user_id();

        let context = self
            .memory
            .context_string(user_id, self.config.router.context_turns)
            .await;
        let intent = self.router.classify(query.text(), &context).await;
        *intent_out = intent.clone();
        states.advance(OrchestratorState::Routed)?;

        if intent.is_unroutable() {
            let mut answer = FinalAnswer::new(CLARIFICATION_ANSWER);
            if intent.routing_failed {
                warn!("Router unavailable; answering with a clarification");
                answer
                    .warnings
                    .push("The question could not be classified right now".to_string());
                states.fail();
            } else {
                self.remember(query, &answer).await;
                states.advance(OrchestratorState::Complete)?;
            }
            return Ok(answer);
        }

        let effective = intent.effective_query(query.text()).to_string();
        let plan = if intent.requires_decomposition {
            let plan = self.decomposer.decompose(&effective, &intent).await;
            states.advance(OrchestratorState::Decomposed)?;
            plan
        } else {
            TaskPlan::trivial(&effective, &intent.roles)
        };

        let answer = self.execute(&effective, &plan, states).await?;
        self.remember(query, &answer).await;
        states.advance(OrchestratorState::Complete)?;
        Ok(answer)
    }

    async fn drive_plan(
        &self,
        query: &Query,
        plan: &TaskPlan,
        states: &mut StateTrail,
    ) -> Result<FinalAnswer> {
        states.advance(OrchestratorState::Decomposed)?;
        let answer = self.execute(query.text(), plan, states).await?;
        self.remember(query, &answer).await;
        states.advance(OrchestratorState::Complete)?;
        Ok(answer)
    }

    /// Dispatch `plan` and synthesize the results, ending in SYNTHESIZED.
    async fn execute(
        &self,
        question: &str,
        plan: &TaskPlan,
        states: &mut StateTrail,
    ) -> Result<FinalAnswer> {
        let dispatched = dispatch(plan, &self.roster).await;
        states.advance(OrchestratorState::Dispatched)?;

        if dispatched.all_failed() {
            return Err(BrainError::Agent(format!(
                "all {} subtasks failed",
                dispatched.failures.len()
            )));
        }

        let mut answer = self.synthesizer.synthesize(question, dispatched.results).await;
        answer.warnings.extend(dispatched.warnings);
        for failure in &dispatched.failures {
            warn!(subtask = %failure.subtask_id, role = %failure.role, "Answer is missing a failed agent");
            answer.warnings.push(format!(
                "{} agent failed: {}",
                failure.role.label(),
                failure.error
            ));
        }
        states.advance(OrchestratorState::Synthesized)?;
        Ok(answer)
    }

    async fn remember(&self, query: &Query, answer: &FinalAnswer) {
        self.memory
            .append_exchange(
                query.user_id(),
                Turn::user(query.text(), query.timestamp()),
                Turn::assistant(answer.text.clone(), answer.agents_used.clone(), now_millis()),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrchestratorState::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut trail = StateTrail::new();
        for next in [Routed, Decomposed, Dispatched, Synthesized, Complete] {
            trail.advance(next).unwrap();
        }
        assert_eq!(
            trail.visited(),
            &[Received, Routed, Decomposed, Dispatched, Synthesized, Complete]
        );
    }

    #[test]
    fn test_clarification_path() {
        let mut trail = StateTrail::new();
        trail.advance(Routed).unwrap();
        trail.advance(Complete).unwrap();
        assert!(trail.current().is_terminal());
    }

    #[test]
    fn test_workflow_path_skips_routing() {
        let mut trail = StateTrail::new();
        for next in [Decomposed, Dispatched, Synthesized, Complete] {
            trail.advance(next).unwrap();
        }
        assert_eq!(trail.current(), Complete);
        assert!(!Routed.can_transition_to(Received));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut trail = StateTrail::new();
        assert!(matches!(trail.advance(Dispatched), Err(BrainError::Internal(_))));
        trail.advance(Routed).unwrap();
        assert!(trail.advance(Synthesized).is_err());
        trail.advance(Complete).unwrap();
        assert!(trail.advance(Error).is_err());
    }

    #[test]
    fn test_fail_from_any_non_terminal_state() {
        let mut trail = StateTrail::new();
        trail.advance(Routed).unwrap();
        trail.advance(Dispatched).unwrap();
        trail.fail();
        assert_eq!(trail.current(), Error);
        trail.fail();
        assert_eq!(trail.visited().len(), 4);
    }

    #[test]
    fn test_states_serialize_upper_case() {
        assert_eq!(serde_json::to_string(&Decomposed).unwrap(), "\"DECOMPOSED\"");
    }
}
