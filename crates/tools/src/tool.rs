//! The closed catalog of tools and their argument schemas.

use brain_common::AgentRole;
use brain_llm::ToolSpec;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    QueryRevenue,
    QueryExpenses,
    CalculateProfitMargin,
    ForecastRevenue,
    CheckBudget,
    GetCampaignPerformance,
    CompareChannels,
    CalculateCustomerAcquisitionCost,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::QueryRevenue,
        Tool::QueryExpenses,
        Tool::CalculateProfitMargin,
        Tool::ForecastRevenue,
        Tool::CheckBudget,
        Tool::GetCampaignPerformance,
        Tool::CompareChannels,
        Tool::CalculateCustomerAcquisitionCost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::QueryRevenue => "query_revenue",
            Self::QueryExpenses => "query_expenses",
            Self::CalculateProfitMargin => "calculate_profit_margin",
            Self::ForecastRevenue => "forecast_revenue",
            Self::CheckBudget => "check_budget",
            Self::GetCampaignPerformance => "get_campaign_performance",
            Self::CompareChannels => "compare_channels",
            Self::CalculateCustomerAcquisitionCost => "calculate_customer_acquisition_cost",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::QueryRevenue => {
                "Get revenue, growth and revenue breakdown for a quarter. \
                 Defaults to the most recent quarter."
            }
            Self::QueryExpenses => {
                "Get expenses for one category (marketing, operations, payroll, r_and_d, other) \
                 or the full breakdown when no category is given."
            }
            Self::CalculateProfitMargin => {
                "Calculate profit and profit margin for the current quarter."
            }
            Self::ForecastRevenue => "Forecast monthly revenue for the next 1-24 months.",
            Self::CheckBudget => {
                "Check the available budget (current profit) and whether a proposed spend \
                 is affordable."
            }
            Self::GetCampaignPerformance => {
                "Get detailed metrics (CTR, CVR, ROAS, CPA) for a marketing campaign, \
                 e.g. FB_Q4_2024, IG_Q4_2024, GOOGLE_Q4_2024."
            }
            Self::CompareChannels => {
                "Compare spend, revenue, ROAS and CPA across marketing channels \
                 (Facebook, Instagram, Google). Compares all channels when none are given."
            }
            Self::CalculateCustomerAcquisitionCost => {
                "Calculate customer acquisition cost and LTV:CAC ratio for a channel."
            }
        }
    }

    /// The agent role this tool belongs to.
    pub fn role(&self) -> AgentRole {
        match self {
            Self::QueryRevenue
            | Self::QueryExpenses
            | Self::CalculateProfitMargin
            | Self::ForecastRevenue
            | Self::CheckBudget => AgentRole::Finance,
            Self::GetCampaignPerformance
            | Self::CompareChannels
            | Self::CalculateCustomerAcquisitionCost => AgentRole::Marketing,
        }
    }

    pub fn for_role(role: AgentRole) -> Vec<Tool> {
        Self::ALL.into_iter().filter(|t| t.role() == role).collect()
    }

    /// JSON Schema for this tool's arguments.
    pub fn parameters(&self) -> serde_json::Value {
        match self {
            Self::QueryRevenue => schema::<RevenueArgs>(),
            Self::QueryExpenses => schema::<ExpenseArgs>(),
            Self::CalculateProfitMargin => schema::<NoArgs>(),
            Self::ForecastRevenue => schema::<ForecastArgs>(),
            Self::CheckBudget => schema::<BudgetArgs>(),
            Self::GetCampaignPerformance => schema::<CampaignArgs>(),
            Self::CompareChannels => schema::<CompareChannelsArgs>(),
            Self::CalculateCustomerAcquisitionCost => schema::<ChannelArgs>(),
        }
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }

    /// Check `arguments` against this tool's schema and decode them.
    ///
    /// A missing (`null`) argument payload is read as an empty object.
    pub(crate) fn parse_args<T: DeserializeOwned>(
        &self,
        arguments: &serde_json::Value,
    ) -> Result<T, ToolError> {
        let value = match arguments {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            serde_json::Value::Object(_) => arguments.clone(),
            other => {
                return Err(ToolError::InvalidArguments {
                    tool: self.name().to_string(),
                    reason: format!("expected a JSON object, got {other}"),
                });
            }
        };
        serde_json::from_value(value).map_err(|e| ToolError::InvalidArguments {
            tool: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}

fn schema<T: JsonSchema>() -> serde_json::Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    value
}

// ============================================================================
// Argument types
// ============================================================================

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RevenueArgs {
    /// Quarter such as "Q3" or "Q4 2024".
    #[serde(default)]
    pub quarter: Option<String>,
    /// Four-digit year, e.g. 2024.
    #[serde(default)]
    pub year: Option<u16>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExpenseArgs {
    /// Expense category; omit for all categories.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ForecastArgs {
    /// Number of months to forecast (1-24).
    #[serde(default = "default_months_ahead")]
    pub months_ahead: u32,
}

fn default_months_ahead() -> u32 {
    3
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BudgetArgs {
    /// Additional spend being considered, in dollars.
    #[serde(default)]
    pub proposed_spend: Option<f64>,
    /// Expense category the spend would go to.
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CampaignArgs {
    /// Campaign ID, e.g. "FB_Q4_2024".
    pub campaign_id: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CompareChannelsArgs {
    /// Channels to compare (Facebook, Instagram, Google).
    #[serde(default)]
    pub channels: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChannelArgs {
    /// Marketing channel name.
    pub channel: String,
}
