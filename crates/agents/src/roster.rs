//! The set of agents available to the dispatcher.

use std::collections::BTreeMap;
use std::sync::Arc;

use brain_common::{AgentRole, BrainError, Result};
use brain_llm::LlmClient;
use brain_tools::ToolRegistry;

use crate::domain::DomainAgent;
use crate::traits::Agent;

/// One agent per role.
#[derive(Clone, Default)]
pub struct AgentRoster {
    agents: BTreeMap<AgentRole, Arc<dyn Agent>>,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finance and marketing agents sharing one capability and dataset.
    pub fn standard(
        llm: Arc<dyn LlmClient>,
        registry: ToolRegistry,
        max_iterations: u32,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Self {
        let mut roster = Self::new();
        for role in AgentRole::ALL {
            let agent = DomainAgent::new(role, Arc::clone(&llm), registry.clone())
                .with_max_iterations(max_iterations)
                .with_sampling(temperature, max_tokens);
            roster.insert(Arc::new(agent));
        }
        roster
    }

    /// Register an agent, replacing any existing one for its role.
    pub fn insert(&mut self, agent: Arc<dyn Agent>) {
        self.agents.insert(agent.role(), agent);
    }

    pub fn get(&self, role: AgentRole) -> Result<Arc<dyn Agent>> {
        self.agents
            .get(&role)
            .cloned()
            .ok_or_else(|| BrainError::Agent(format!("no agent registered for role {role}")))
    }

    pub fn roles(&self) -> impl Iterator<Item = AgentRole> + '_ {
        self.agents.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
