//! Prebuilt multi-agent plans for recurring business questions.
//!
//! A workflow skips routing and decomposition: its plan is fixed, with the
//! dependency edges spelled out, and runs through the same dispatch and
//! synthesis as any decomposed question.

use brain_common::{AgentRole, BrainError, Intent, Result, Subtask, TaskPlan};
use brain_tools::format::usd_rounded;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "workflow", rename_all = "snake_case")]
pub enum Workflow {
    /// Can we afford `proposed_spend` on `category`?
    BudgetCheck {
        proposed_spend: f64,
        #[serde(default = "default_category")]
        category: String,
    },
    /// Which marketing channel deserves more budget.
    ChannelOptimization,
    /// True ROI of one campaign, net of the company's margin.
    RoiAnalysis { campaign_id: String },
}

fn default_category() -> String {
    "marketing".to_string()
}

impl Workflow {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BudgetCheck { .. } => "budget_check",
            Self::ChannelOptimization => "channel_optimization",
            Self::RoiAnalysis { .. } => "roi_analysis",
        }
    }

    /// The question this workflow answers, as recorded in conversation memory.
    pub fn question(&self) -> String {
        match self {
            Self::BudgetCheck {
                proposed_spend,
                category,
            } => format!(
                "Can we afford to spend {} on {}?",
                usd_rounded(*proposed_spend),
                category.trim()
            ),
            Self::ChannelOptimization => {
                "Which marketing channel should we invest more in?".to_string()
            }
            Self::RoiAnalysis { campaign_id } => {
                format!("What is the true ROI of campaign {}?", campaign_id.trim())
            }
        }
    }

    /// Every role the plan assigns work to.
    pub fn roles(&self) -> Vec<AgentRole> {
        match self {
            Self::BudgetCheck { .. } => vec![AgentRole::Finance],
            Self::ChannelOptimization | Self::RoiAnalysis { .. } => {
                vec![AgentRole::Finance, AgentRole::Marketing]
            }
        }
    }

    /// The intent a workflow stands in for: its roles, fully confident.
    pub fn intent(&self) -> Intent {
        let mut intent = Intent::new(self.roles(), 1.0);
        intent.requires_decomposition = true;
        intent
    }

    /// Build and validate the plan. Fails only on unusable arguments.
    pub fn plan(&self) -> Result<TaskPlan> {
        let subtasks = match self {
            Self::BudgetCheck {
                proposed_spend,
                category,
            } => {
                if !proposed_spend.is_finite() || *proposed_spend <= 0.0 {
                    return Err(BrainError::Decomposition(format!(
                        "proposed_spend must be a positive amount, got {proposed_spend}"
                    )));
                }
                if category.trim().is_empty() {
                    return Err(BrainError::Decomposition("category is empty".into()));
                }
                vec![
                    Subtask::new(
                        "financials",
                        AgentRole::Finance,
                        "What are our current expenses and available budget?",
                    ),
                    Subtask::new(
                        "decision",
                        AgentRole::Finance,
                        format!(
                            "We're considering spending {} on {}. Based on our financials, \
                             can we afford this? Start your answer with yes or no.",
                            usd_rounded(*proposed_spend),
                            category.trim()
                        ),
                    )
                    .after("financials"),
                ]
            }
            Self::ChannelOptimization => vec![
                Subtask::new(
                    "channels",
                    AgentRole::Marketing,
                    "Compare Facebook, Instagram, and Google channel performance.",
                ),
                Subtask::new(
                    "budget",
                    AgentRole::Finance,
                    "What is our available marketing budget?",
                ),
                Subtask::new(
                    "recommendation",
                    AgentRole::Marketing,
                    "Based on the channel performance and the available budget, \
                     recommend which channel to invest more in.",
                )
                .after("channels")
                .after("budget"),
            ],
            Self::RoiAnalysis { campaign_id } => {
                let campaign_id = campaign_id.trim();
                if campaign_id.is_empty() {
                    return Err(BrainError::Decomposition("campaign_id is empty".into()));
                }
                vec![
                    Subtask::new(
                        "campaign",
                        AgentRole::Marketing,
                        format!("How did campaign {campaign_id} perform?"),
                    ),
                    Subtask::new(
                        "margin",
                        AgentRole::Finance,
                        "Calculate our profit margin to determine true profitability.",
                    ),
                    Subtask::new(
                        "roi",
                        AgentRole::Finance,
                        format!(
                            "Provide a complete ROI analysis for campaign {campaign_id}: \
                             calculate its true ROI from the campaign data and the \
                             company profit margin, and give a recommendation."
                        ),
                    )
                    .after("campaign")
                    .after("margin"),
                ]
            }
        };

        TaskPlan::validate(subtasks, &self.intent())
    }
}
