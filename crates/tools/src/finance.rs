//! Finance tool handlers.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};

use crate::dataset::BusinessData;
use crate::error::ToolError;
use crate::format::{percent, usd, usd_rounded};
use crate::tool::{BudgetArgs, ExpenseArgs, ForecastArgs, RevenueArgs};

const MAX_FORECAST_MONTHS: u32 = 24;

/// Accepts "Q4", "q4", "4", "Q4 2024", "Q4_2024", "Q4-2024".
static QUARTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*q?([1-4])(?:[\s_\-/]*(\d{4}))?\s*$").expect("valid quarter regex")
});

fn no_data() -> ToolError {
    ToolError::Execution("No data found for specified period".to_string())
}

/// Resolve the requested period, filling gaps from the dataset default.
fn resolve_period(data: &BusinessData, args: &RevenueArgs) -> Result<(u8, u16), ToolError> {
    let (default_quarter, default_year) = data.default_period;
    let (quarter, embedded_year) = match args.quarter.as_deref() {
        None => (default_quarter, None),
        Some(raw) => {
            let caps = QUARTER_PATTERN.captures(raw).ok_or_else(no_data)?;
            let quarter = caps[1].parse::<u8>().map_err(|_| no_data())?;
            let year = caps.get(2).and_then(|m| m.as_str().parse::<u16>().ok());
            (quarter, year)
        }
    };
    Ok((quarter, args.year.or(embedded_year).unwrap_or(default_year)))
}

pub fn query_revenue(data: &BusinessData, args: RevenueArgs) -> Result<Value, ToolError> {
    let (quarter, year) = resolve_period(data, &args)?;
    let record = data.revenue_for(quarter, year).ok_or_else(no_data)?;

    let breakdown: serde_json::Map<String, Value> = record
        .breakdown
        .iter()
        .map(|(name, amount)| (name.clone(), Value::String(usd(*amount))))
        .collect();

    Ok(json!({
        "period": record.period(),
        "revenue": usd(record.revenue),
        "revenue_usd": record.revenue,
        "growth": percent(record.growth_rate * 100.0, 0),
        "breakdown": breakdown,
    }))
}

fn normalize_category(raw: &str) -> String {
    raw.to_lowercase()
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

pub fn query_expenses(data: &BusinessData, args: ExpenseArgs) -> Result<Value, ToolError> {
    let total = data.total_expenses();

    if let Some(raw) = args.category.as_deref().filter(|c| !c.trim().is_empty()) {
        let category = normalize_category(raw);
        let amount = data.expense(&category).ok_or_else(|| {
            ToolError::Execution(format!(
                "Unknown expense category '{raw}'. Available: {}",
                data.expenses
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        let share = if total == 0 {
            0.0
        } else {
            amount as f64 / total as f64 * 100.0
        };
        return Ok(json!({
            "category": category,
            "amount": usd(amount),
            "amount_usd": amount,
            "percentage_of_total": percent(share, 1),
        }));
    }

    let breakdown: serde_json::Map<String, Value> = data
        .expenses
        .iter()
        .map(|(name, amount)| (name.clone(), Value::String(usd(*amount))))
        .collect();

    Ok(json!({
        "total": usd(total),
        "total_usd": total,
        "breakdown": breakdown,
    }))
}

pub fn calculate_profit_margin(data: &BusinessData) -> Result<Value, ToolError> {
    let record = data.current_revenue().ok_or_else(no_data)?;
    let expenses = data.total_expenses();
    let profit = record.revenue as i128 - expenses as i128;
    let margin = if record.revenue == 0 {
        0.0
    } else {
        profit as f64 / record.revenue as f64 * 100.0
    };

    Ok(json!({
        "period": record.period(),
        "revenue": usd(record.revenue),
        "expenses": usd(expenses),
        "profit": signed_usd(profit),
        "margin": percent(margin, 1),
    }))
}

pub fn forecast_revenue(data: &BusinessData, args: ForecastArgs) -> Result<Value, ToolError> {
    if args.months_ahead == 0 || args.months_ahead > MAX_FORECAST_MONTHS {
        return Err(ToolError::InvalidArguments {
            tool: "forecast_revenue".to_string(),
            reason: format!("months_ahead must be between 1 and {MAX_FORECAST_MONTHS}"),
        });
    }
    let base = data.current_revenue().ok_or_else(no_data)?.revenue as f64;
    let rate = data.monthly_growth_rate;

    let forecast: Vec<Value> = (1..=args.months_ahead)
        .map(|i| {
            json!({
                "month": format!("Month +{i}"),
                "revenue": usd_rounded(base * (1.0 + rate).powi(i as i32)),
            })
        })
        .collect();

    Ok(json!({
        "base_revenue": usd_rounded(base),
        "growth_rate": percent(rate * 100.0, 0),
        "forecast": forecast,
    }))
}

/// Available budget is the current period's profit.
pub fn check_budget(data: &BusinessData, args: BudgetArgs) -> Result<Value, ToolError> {
    let record = data.current_revenue().ok_or_else(no_data)?;
    let expenses = data.total_expenses();
    let available = record.revenue as i128 - expenses as i128;

    let mut out = json!({
        "period": record.period(),
        "revenue": usd(record.revenue),
        "total_expenses": usd(expenses),
        "available_budget": signed_usd(available),
        "available_budget_usd": available as f64,
    });

    if let Some(raw) = args.category.as_deref().filter(|c| !c.trim().is_empty()) {
        let category = normalize_category(raw);
        match data.expense(&category) {
            Some(current) => {
                out["category"] = json!(category);
                out["current_category_spend"] = json!(usd(current));
            }
            None => {
                return Err(ToolError::Execution(format!(
                    "Unknown expense category '{raw}'"
                )));
            }
        }
    }

    if let Some(proposed) = args.proposed_spend {
        if !proposed.is_finite() || proposed < 0.0 {
            return Err(ToolError::InvalidArguments {
                tool: "check_budget".to_string(),
                reason: "proposed_spend must be a non-negative amount".to_string(),
            });
        }
        let remaining = available as f64 - proposed;
        out["proposed_spend"] = json!(usd_rounded(proposed));
        out["affordable"] = json!(remaining >= 0.0);
        out["remaining_after_spend"] = json!(signed_usd(remaining.round() as i128));
    }

    Ok(out)
}

fn signed_usd(amount: i128) -> String {
    if amount < 0 {
        format!("-{}", usd(amount.unsigned_abs() as u64))
    } else {
        usd(amount as u64)
    }
}
