//! The business dataset tools read from.
//!
//! Handlers never reach outside this struct, so a registry built over a
//! different dataset behaves deterministically for that data.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRecord {
    /// 1..=4
    pub quarter: u8,
    pub year: u16,
    pub revenue: u64,
    /// Growth over the previous quarter, as a fraction.
    pub growth_rate: f64,
    pub breakdown: Vec<(String, u64)>,
}

impl RevenueRecord {
    pub fn period(&self) -> String {
        format!("Q{}_{}", self.quarter, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub platform: String,
    pub spend: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    /// Other names the channel is known by, e.g. "Google Ads".
    #[serde(default)]
    pub aliases: Vec<String>,
    pub spend: u64,
    pub revenue: u64,
    pub conversions: u64,
    pub customers: u64,
    /// Assumed customer lifetime value.
    pub lifetime_value: f64,
}

impl Channel {
    pub fn matches(&self, name: &str) -> bool {
        let needle = name.trim();
        self.name.eq_ignore_ascii_case(needle)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessData {
    pub revenue: Vec<RevenueRecord>,
    /// Period used when a query names none: (quarter, year).
    pub default_period: (u8, u16),
    /// Expenses for the default period, by category.
    pub expenses: Vec<(String, u64)>,
    pub campaigns: Vec<Campaign>,
    pub channels: Vec<Channel>,
    /// Compounding monthly growth used for forecasts.
    pub monthly_growth_rate: f64,
}

impl BusinessData {
    pub fn revenue_for(&self, quarter: u8, year: u16) -> Option<&RevenueRecord> {
        self.revenue
            .iter()
            .find(|r| r.quarter == quarter && r.year == year)
    }

    pub fn current_revenue(&self) -> Option<&RevenueRecord> {
        let (quarter, year) = self.default_period;
        self.revenue_for(quarter, year)
    }

    pub fn total_expenses(&self) -> u64 {
        self.expenses.iter().map(|(_, amount)| amount).sum()
    }

    pub fn expense(&self, category: &str) -> Option<u64> {
        self.expenses
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, amount)| *amount)
    }

    pub fn campaign(&self, id: &str) -> Option<&Campaign> {
        self.campaigns
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.matches(name))
    }
}

impl Default for BusinessData {
    /// The Q4 2024 demo company.
    fn default() -> Self {
        Self {
            revenue: vec![
                RevenueRecord {
                    quarter: 4,
                    year: 2024,
                    revenue: 15_000_000,
                    growth_rate: 0.25,
                    breakdown: vec![
                        ("product_sales".into(), 10_000_000),
                        ("services".into(), 3_000_000),
                        ("subscriptions".into(), 2_000_000),
                    ],
                },
                RevenueRecord {
                    quarter: 3,
                    year: 2024,
                    revenue: 12_000_000,
                    growth_rate: 0.15,
                    breakdown: vec![
                        ("product_sales".into(), 8_000_000),
                        ("services".into(), 2_500_000),
                        ("subscriptions".into(), 1_500_000),
                    ],
                },
            ],
            default_period: (4, 2024),
            expenses: vec![
                ("marketing".into(), 2_500_000),
                ("operations".into(), 1_500_000),
                ("payroll".into(), 4_000_000),
                ("r_and_d".into(), 2_000_000),
                ("other".into(), 500_000),
            ],
            campaigns: vec![
                campaign("FB_Q4_2024", "Facebook", 250_000, 5_000_000, 100_000, 2_500, 500_000),
                campaign("IG_Q4_2024", "Instagram", 200_000, 3_000_000, 75_000, 2_000, 400_000),
                campaign("GOOGLE_Q4_2024", "Google Ads", 300_000, 8_000_000, 120_000, 3_000, 600_000),
            ],
            channels: vec![
                channel("Facebook", &["fb", "meta"], 250_000, 500_000, 2_500),
                channel("Instagram", &["ig"], 200_000, 400_000, 2_000),
                channel("Google", &["google ads", "adwords"], 300_000, 600_000, 3_000),
            ],
            monthly_growth_rate: 0.05,
        }
    }
}

fn channel(name: &str, aliases: &[&str], spend: u64, revenue: u64, conversions: u64) -> Channel {
    Channel {
        name: name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        spend,
        revenue,
        conversions,
        customers: conversions,
        lifetime_value: 300.0,
    }
}

fn campaign(
    id: &str,
    platform: &str,
    spend: u64,
    impressions: u64,
    clicks: u64,
    conversions: u64,
    revenue: u64,
) -> Campaign {
    Campaign {
        id: id.to_string(),
        platform: platform.to_string(),
        spend,
        impressions,
        clicks,
        conversions,
        revenue,
    }
}
