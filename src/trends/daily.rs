//! Daily trend calculations
//!
//! Builds the daily consumption trend (overall and per tier, with per-date
//! item drill-down) and the daily purchaser series.

use std::collections::{BTreeMap, HashMap};

use super::grouping::{daily_sums, group_by_date, matches_tier, DateGroups};
use super::statistics::compute_trend;
use super::{BuyersTrend, ConsumptionTrend, ItemShare, PointDetail, TierBuyers, TierTrend, TrendSummary};
use crate::models::{DateKey, Field, PaymentTier, Record};

/// Label used when a record carries no item name
pub const UNKNOWN_ITEM: &str = "Unknown Item";

/// Item name of a record, or [`UNKNOWN_ITEM`]
pub fn item_label(record: &Record) -> String {
    record
        .label(Field::ItemName)
        .map(|name| name.into_owned())
        .unwrap_or_else(|| UNKNOWN_ITEM.to_string())
}

/// Per-item consumption for one day's records, ranked descending.
///
/// Each item's percentage is its share of the day's total (0 when the total is 0).
pub fn calculate_daily_item_consumption<'a, I>(records: I) -> Vec<ItemShare>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<(String, f64)> = Vec::new();

    for record in records {
        let name = item_label(record);
        let amount = record.number(Field::Amount);
        match index.get(&name) {
            Some(&i) => items[i].1 += amount,
            None => {
                index.insert(name.clone(), items.len());
                items.push((name, amount));
            }
        }
    }

    let total: f64 = items.iter().map(|(_, v)| v).sum();

    let mut shares: Vec<ItemShare> = items
        .into_iter()
        .map(|(name, value)| ItemShare {
            name,
            value,
            percentage: if total > 0.0 { value / total } else { 0.0 },
        })
        .collect();

    // stable sort keeps first-encounter order for equal values
    shares.sort_by(|a, b| b.value.total_cmp(&a.value));
    shares
}

/// Drill-down details for every date, optionally restricted to one tier
fn point_details(groups: &DateGroups<'_>, tier: Option<PaymentTier>) -> BTreeMap<DateKey, PointDetail> {
    groups
        .iter()
        .map(|(date, records)| {
            let items = calculate_daily_item_consumption(
                records.iter().copied().filter(|r| matches_tier(r, tier)),
            );
            let value: f64 = items.iter().map(|i| i.value).sum();
            (
                date.clone(),
                PointDetail {
                    date: date.clone(),
                    value,
                    items,
                },
            )
        })
        .collect()
}

/// Trend of one tier (or of everything when `tier` is `None`)
pub fn tier_trend(groups: &DateGroups<'_>, tier: Option<PaymentTier>) -> TrendSummary {
    let series = daily_sums(groups, Field::Amount, tier);
    compute_trend(&series).with_point_details(point_details(groups, tier))
}

/// Analyze daily consumption overall and for each payment tier.
///
/// The same statistics run once on the full series and once per tier.
pub fn analyze_consumption_trend(records: &[Record]) -> ConsumptionTrend {
    let groups = group_by_date(records);

    let total = tier_trend(&groups, None);
    let tiers = PaymentTier::ALL
        .into_iter()
        .map(|tier| TierTrend {
            tier,
            trend: tier_trend(&groups, Some(tier)),
        })
        .collect();

    tracing::debug!(
        "Consumption trend covers {} dates, total {:.0}",
        total.dates.len(),
        total.total()
    );

    ConsumptionTrend { total, tiers }
}

/// Daily purchaser counts (sum of role counts), overall and per tier
pub fn calculate_daily_buyers(records: &[Record]) -> BuyersTrend {
    let groups = group_by_date(records);

    let buyers_by_tier: Vec<TierBuyers> = PaymentTier::ALL
        .into_iter()
        .map(|tier| TierBuyers {
            tier,
            values: daily_sums(&groups, Field::RoleCount, Some(tier))
                .into_iter()
                .map(|p| p.value)
                .collect(),
        })
        .collect();

    // total is the sum over the five known tiers only
    let total_buyers = (0..groups.len())
        .map(|i| buyers_by_tier.iter().map(|t| t.values[i]).sum::<f64>())
        .collect();

    BuyersTrend {
        dates: groups.keys().cloned().collect(),
        total_buyers,
        buyers_by_tier,
    }
}
