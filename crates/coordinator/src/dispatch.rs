//! Running a task plan across agents.
//!
//! Subtasks whose dependencies have all returned are started together and
//! polled as an unordered set; each completion may unblock more subtasks.
//! Dependents receive their dependencies' answers as context.

use std::collections::HashMap;
use std::sync::Arc;

use brain_agents::{Agent, AgentRoster};
use brain_common::{AgentResult, AgentRole, Result, Subtask, TaskPlan};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, info, warn};

const PREVIOUS_OUTPUT_HEADER: &str = "--- Previous Agent Output ---";

/// A subtask whose agent returned an error.
#[derive(Debug, Clone)]
pub struct SubtaskFailure {
    pub subtask_id: String,
    pub role: AgentRole,
    pub error: String,
}

/// Everything the dispatcher learned from one plan.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Successful (possibly partial) results, in plan order.
    pub results: Vec<AgentResult>,
    pub failures: Vec<SubtaskFailure>,
    pub warnings: Vec<String>,
}

impl DispatchOutcome {
    pub fn all_failed(&self) -> bool {
        self.results.is_empty()
    }
}

async fn run_subtask(
    agent: Arc<dyn Agent>,
    subtask: Subtask,
    context: String,
) -> (String, Result<AgentResult>) {
    let result = agent.run(&subtask, &context).await;
    (subtask.id, result)
}

/// Compose the dependency context for `subtask` from finished results.
fn dependency_context(
    subtask: &Subtask,
    plan: &TaskPlan,
    finished: &HashMap<String, std::result::Result<AgentResult, String>>,
    warnings: &mut Vec<String>,
) -> String {
    let mut sections = Vec::new();
    // Plan order, so context is deterministic.
    for dep in plan.subtasks().iter().filter(|s| subtask.depends_on.contains(&s.id)) {
        match finished.get(&dep.id) {
            Some(Ok(result)) => sections.push(format!(
                "{PREVIOUS_OUTPUT_HEADER}\n[{} agent, subtask {}]\n{}",
                result.role.label(),
                dep.id,
                result.answer
            )),
            _ => {
                let warning = format!(
                    "Subtask '{}' ran without the output of failed subtask '{}'",
                    subtask.id, dep.id
                );
                warn!(subtask = %subtask.id, dependency = %dep.id, "Dependency failed, continuing without it");
                warnings.push(warning);
            }
        }
    }
    sections.join("\n\n")
}

/// Run every subtask of `plan`, respecting dependencies.
///
/// Never fails as a whole: agent errors are collected as failures and the
/// caller decides whether anything usable came back.
pub async fn dispatch(plan: &TaskPlan, roster: &AgentRoster) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let mut finished: HashMap<String, std::result::Result<AgentResult, String>> = HashMap::new();
    let mut started: Vec<bool> = vec![false; plan.len()];
    let mut in_flight = FuturesUnordered::new();

    loop {
        let mut progressed = false;
        for (idx, subtask) in plan.subtasks().iter().enumerate() {
            if started[idx] || !subtask.depends_on.iter().all(|d| finished.contains_key(d)) {
                continue;
            }
            started[idx] = true;
            progressed = true;

            let agent = match roster.get(subtask.assigned_role) {
                Ok(agent) => agent,
                Err(e) => {
                    warn!(subtask = %subtask.id, error = %e, "No agent for subtask");
                    finished.insert(subtask.id.clone(), Err(e.to_string()));
                    outcome.failures.push(SubtaskFailure {
                        subtask_id: subtask.id.clone(),
                        role: subtask.assigned_role,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let context = dependency_context(subtask, plan, &finished, &mut outcome.warnings);
            debug!(
                subtask = %subtask.id,
                role = %subtask.assigned_role,
                dependencies = subtask.depends_on.len(),
                "Starting subtask"
            );
            in_flight.push(run_subtask(agent, subtask.clone(), context));
        }

        let Some((id, result)) = in_flight.next().await else {
            // A missing agent can unblock dependents without anything in flight.
            if started.iter().all(|s| *s) || !progressed {
                break;
            }
            continue;
        };

        match result {
            Ok(agent_result) => {
                debug!(subtask = %id, elapsed_ms = agent_result.elapsed_ms, "Subtask finished");
                finished.insert(id, Ok(agent_result));
            }
            Err(e) => {
                warn!(subtask = %id, error = %e, "Subtask failed");
                if let Some(subtask) = plan.get(&id) {
                    outcome.failures.push(SubtaskFailure {
                        subtask_id: id.clone(),
                        role: subtask.assigned_role,
                        error: e.to_string(),
                    });
                }
                finished.insert(id, Err(e.to_string()));
            }
        }
    }

    for subtask in plan.subtasks() {
        if let Some(Ok(result)) = finished.remove(&subtask.id) {
            outcome.results.push(result);
        }
    }

    info!(
        succeeded = outcome.results.len(),
        failed = outcome.failures.len(),
        "Plan dispatched"
    );
    outcome
}
