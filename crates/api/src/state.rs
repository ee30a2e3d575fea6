//! Application state for the API server.

use std::sync::Arc;
use std::time::Instant;

use brain_coordinator::{CoordinatorConfig, Orchestrator};

use crate::auth::ApiKeyConfig;

/// Shared application state for the API server.
pub struct AppState {
    /// Runs every query; owns the conversation memory.
    pub orchestrator: Arc<Orchestrator>,

    /// Bearer key required on every route except `/health`, when set.
    pub api_key: Option<ApiKeyConfig>,

    /// Server start time (for health checks)
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            api_key: None,
            start_time: Instant::now(),
        }
    }

    /// Build the orchestrator and its provider client from `config`.
    pub fn from_config(config: CoordinatorConfig) -> brain_common::Result<Self> {
        Ok(Self::new(Orchestrator::from_config(config)?))
    }

    pub fn with_api_key(mut self, api_key: ApiKeyConfig) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
