//! Configuration for the coordinator.
//!
//! # Security
//!
//! - Config file permission validation on Unix systems
//! - Rejects world-readable files containing API keys
//! - Warns about API keys stored in config files

use brain_llm::LlmConfig;
use brain_memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Main coordinator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Reasoning capability and its call policy
    #[serde(default)]
    pub provider: LlmConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub agents: AgentsConfig,

    /// Per-user conversation window
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Confidence at or below this routes to clarification.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Recent turns summarized for follow-up resolution.
    #[serde(default = "default_router_context_turns")]
    pub context_turns: usize,
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_router_context_turns() -> usize {
    4
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            context_turns: default_router_context_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Hard cap on tool-use iterations per subtask.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_max_iterations() -> u32 {
    brain_agents::DEFAULT_MAX_ITERATIONS
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Security
    ///
    /// On Unix systems, this function validates that:
    /// - The file is a regular file (not a symlink)
    /// - The file is not world-readable if it contains an API key
    /// - Warns if API keys are stored in the config file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_config_file_permissions(path)?;

        let config = Self::from_file_unchecked(path)?;

        if config.provider.api_key.is_some() {
            warn!(
                "API key found in config file '{}'. For better security, \
                 use environment variables instead (OPENAI_API_KEY, ANTHROPIC_API_KEY).",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    ///
    /// Use this only for testing or when you've already validated the file.
    pub fn from_file_unchecked(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.router.confidence_threshold) {
            anyhow::bail!(
                "router.confidence_threshold must be within [0, 1], got {}",
                self.router.confidence_threshold
            );
        }
        if self.agents.max_iterations == 0 {
            anyhow::bail!("agents.max_iterations must be at least 1");
        }
        if self.memory.max_turns == 0 {
            anyhow::bail!("memory.max_turns must be at least 1");
        }
        Ok(())
    }
}

/// Validate config file permissions on Unix systems.
///
/// Requirements:
/// - File must be a regular file (not symlink, directory, etc.)
/// - File must not be world-writable (mode & 0o002 == 0)
/// - If file contains API key patterns, must not be world-readable
#[cfg(unix)]
fn validate_config_file_permissions(path: &std::path::Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Symlinks and directories are not allowed.",
            path.display()
        );
    }

    let permission_bits = metadata.permissions().mode() & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)?;
    let has_api_key = content.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("api_key") && line.contains('=') && !line.contains("\"\"")
    });

    if has_api_key && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains an API key but is world-readable (mode {:04o}). \
             Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_api_key && permission_bits & 0o040 != 0 {
        warn!(
            "Config file '{}' contains an API key and is group-readable (mode {:04o}). \
             Consider restricting access with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}
