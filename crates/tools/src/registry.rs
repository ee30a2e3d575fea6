//! Tool lookup, validation and dispatch.

use std::sync::Arc;

use brain_common::{AgentRole, ToolCall, ToolResult};
use brain_llm::ToolSpec;
use tracing::{debug, warn};

use crate::dataset::BusinessData;
use crate::error::ToolError;
use crate::finance;
use crate::marketing;
use crate::tool::Tool;

/// The catalog of tools bound to one dataset.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    data: Arc<BusinessData>,
}

impl ToolRegistry {
    pub fn new(data: BusinessData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn data(&self) -> &BusinessData {
        &self.data
    }

    pub fn specs(tools: &[Tool]) -> Vec<ToolSpec> {
        tools.iter().map(Tool::spec).collect()
    }

    /// Run one call on behalf of an agent restricted to `allowed`.
    ///
    /// Unknown names, tools outside `allowed`, and arguments that do not
    /// match the schema are rejected before any handler runs.
    pub fn dispatch(&self, call: &ToolCall, allowed: &[Tool]) -> ToolResult {
        match self.try_dispatch(call, allowed) {
            Ok(value) => {
                debug!(tool = %call.tool_name, role = %call.requested_by, "Tool call succeeded");
                ToolResult::value(&call.tool_name, value)
            }
            Err(e) => {
                warn!(
                    tool = %call.tool_name,
                    role = %call.requested_by,
                    rejected = e.is_argument_error(),
                    error = %e,
                    "Tool call failed"
                );
                ToolResult::error(&call.tool_name, e.to_string())
            }
        }
    }

    fn try_dispatch(&self, call: &ToolCall, allowed: &[Tool]) -> Result<serde_json::Value, ToolError> {
        let tool = Tool::from_name(&call.tool_name)
            .ok_or_else(|| ToolError::UnknownTool(call.tool_name.clone()))?;
        if !allowed.contains(&tool) {
            return Err(ToolError::NotPermitted {
                tool: call.tool_name.clone(),
                role: call.requested_by.to_string(),
            });
        }
        self.invoke(tool, &call.arguments)
    }

    /// Validate arguments and run the handler.
    pub fn invoke(&self, tool: Tool, arguments: &serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let data = self.data.as_ref();
        match tool {
            Tool::QueryRevenue => finance::query_revenue(data, tool.parse_args(arguments)?),
            Tool::QueryExpenses => finance::query_expenses(data, tool.parse_args(arguments)?),
            Tool::CalculateProfitMargin => {
                let crate::tool::NoArgs {} = tool.parse_args(arguments)?;
                finance::calculate_profit_margin(data)
            }
            Tool::ForecastRevenue => finance::forecast_revenue(data, tool.parse_args(arguments)?),
            Tool::CheckBudget => finance::check_budget(data, tool.parse_args(arguments)?),
            Tool::GetCampaignPerformance => {
                marketing::get_campaign_performance(data, tool.parse_args(arguments)?)
            }
            Tool::CompareChannels => marketing::compare_channels(data, tool.parse_args(arguments)?),
            Tool::CalculateCustomerAcquisitionCost => {
                marketing::calculate_customer_acquisition_cost(data, tool.parse_args(arguments)?)
            }
        }
    }
}

/// Tools available to each role.
pub fn tools_for(role: AgentRole) -> Vec<Tool> {
    Tool::for_role(role)
}
