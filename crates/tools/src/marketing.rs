//! Marketing tool handlers.

use serde_json::{Value, json};

use crate::dataset::{BusinessData, Channel};
use crate::error::ToolError;
use crate::format::{group_thousands, percent, ratio, usd, usd_cents};
use crate::tool::{CampaignArgs, ChannelArgs, CompareChannelsArgs};

fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

pub fn get_campaign_performance(data: &BusinessData, args: CampaignArgs) -> Result<Value, ToolError> {
    let campaign = data.campaign(&args.campaign_id).ok_or_else(|| {
        ToolError::Execution(format!(
            "Campaign {} not found. Available: {}",
            args.campaign_id,
            data.campaigns
                .iter()
                .map(|c| c.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;

    let ctr = safe_div(campaign.clicks as f64, campaign.impressions as f64) * 100.0;
    let cvr = safe_div(campaign.conversions as f64, campaign.clicks as f64) * 100.0;
    let roas = safe_div(campaign.revenue as f64, campaign.spend as f64);
    let cpa = safe_div(campaign.spend as f64, campaign.conversions as f64);

    Ok(json!({
        "campaign_id": campaign.id,
        "platform": campaign.platform,
        "spend": usd(campaign.spend),
        "impressions": group_thousands(campaign.impressions),
        "clicks": group_thousands(campaign.clicks),
        "conversions": campaign.conversions,
        "revenue": usd(campaign.revenue),
        "ctr": percent(ctr, 2),
        "cvr": percent(cvr, 2),
        "roas": ratio(roas),
        "cpa": usd_cents(cpa),
    }))
}

fn channel_summary(channel: &Channel) -> Value {
    let roas = safe_div(channel.revenue as f64, channel.spend as f64);
    let cpa = safe_div(channel.spend as f64, channel.conversions as f64);
    json!({
        "spend": usd(channel.spend),
        "revenue": usd(channel.revenue),
        "roas": ratio(roas),
        "cpa": usd_cents(cpa),
        "conversions": channel.conversions,
    })
}

/// Compare the named channels, or every channel when none are named.
///
/// Unknown names are reported alongside the ones that matched; the call
/// only fails when nothing matched.
pub fn compare_channels(data: &BusinessData, args: CompareChannelsArgs) -> Result<Value, ToolError> {
    let mut comparison = serde_json::Map::new();
    let mut unknown = Vec::new();

    if args.channels.is_empty() {
        for channel in &data.channels {
            comparison.insert(channel.name.clone(), channel_summary(channel));
        }
    } else {
        for name in &args.channels {
            match data.channel(name) {
                Some(channel) => {
                    comparison.insert(channel.name.clone(), channel_summary(channel));
                }
                None => unknown.push(name.clone()),
            }
        }
    }

    if comparison.is_empty() {
        return Err(ToolError::Execution(format!(
            "No matching channels for {}. Available: {}",
            unknown.join(", "),
            data.channels
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let best = data
        .channels
        .iter()
        .filter(|c| comparison.contains_key(&c.name))
        .max_by(|a, b| {
            let ra = safe_div(a.revenue as f64, a.spend as f64);
            let rb = safe_div(b.revenue as f64, b.spend as f64);
            ra.total_cmp(&rb)
        })
        .map(|c| c.name.clone());

    let mut out = json!({ "channels": comparison, "best_roas": best });
    if !unknown.is_empty() {
        out["unknown_channels"] = json!(unknown);
    }
    Ok(out)
}

pub fn calculate_customer_acquisition_cost(
    data: &BusinessData,
    args: ChannelArgs,
) -> Result<Value, ToolError> {
    let channel = data
        .channel(&args.channel)
        .ok_or_else(|| ToolError::Execution(format!("Channel {} not found", args.channel)))?;

    let cac = safe_div(channel.spend as f64, channel.customers as f64);
    let ltv_cac = safe_div(channel.lifetime_value, cac);
    let health = if ltv_cac >= 3.0 { "healthy" } else { "needs attention" };

    Ok(json!({
        "channel": channel.name,
        "total_spend": usd(channel.spend),
        "customers_acquired": channel.customers,
        "cac": usd_cents(cac),
        "ltv_cac_ratio": format!("{} ({health})", ratio(ltv_cac)),
    }))
}
