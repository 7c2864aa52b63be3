//! Item / product aggregation
//!
//! Ranks items by consumption, splits spending into cosmetic and power
//! categories, and breaks each item down by payment tier.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{DateKey, Field, PaymentTier, Record};
use crate::trends::daily::item_label;
use crate::trends::grouping::{channel_label, group_by_date};

/// Default number of items kept in the ranking
pub const DEFAULT_TOP_N: usize = 20;

/// Rule deciding whether a record counts as cosmetic (appearance) spending
pub struct CosmeticPolicy;

impl CosmeticPolicy {
    /// Channels that are always cosmetic
    pub const COSMETIC_CHANNELS: [&'static str; 2] = ["Unlock Appearance", "Monthly Costume Lottery"];
    /// Exchange channel that is cosmetic only for [`Self::EXCHANGE_ITEM`]
    pub const EXCHANGE_CHANNEL: &'static str = "Passive Currency Exchange";
    pub const EXCHANGE_ITEM: &'static str = "Dream-Weaving Voucher";

    /// Classify a record into exactly one category
    pub fn classify(record: &Record) -> ProductCategory {
        let channel = channel_label(record);
        if Self::COSMETIC_CHANNELS.contains(&channel.as_str()) {
            return ProductCategory::Cosmetic;
        }
        if channel == Self::EXCHANGE_CHANNEL && item_label(record) == Self::EXCHANGE_ITEM {
            return ProductCategory::Cosmetic;
        }
        ProductCategory::Power
    }
}

/// Spending category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Appearance items
    Cosmetic,
    /// Everything that improves strength
    Power,
}

impl ProductCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cosmetic => "Appearance",
            Self::Power => "Value",
        }
    }
}

/// One ranked item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    pub name: String,
    pub value: f64,
}

/// Items ranked by consumption
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRankingData {
    pub products: Vec<RankedProduct>,
    /// Sum over `products` (not over every item)
    pub total_consumption: f64,
}

/// Sum of amounts per item in first-encounter order
fn item_totals<'a, I>(records: I) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<(String, f64)> = Vec::new();

    for record in records {
        let name = item_label(record);
        let amount = record.number(Field::Amount);
        match index.get(&name) {
            Some(&i) => totals[i].1 += amount,
            None => {
                index.insert(name.clone(), totals.len());
                totals.push((name, amount));
            }
        }
    }

    totals
}

/// Top `top_n` items by total consumption. Items summing to zero or less are dropped.
pub fn rank_products<'a, I>(records: I, top_n: usize) -> ProductRankingData
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut totals: Vec<(String, f64)> = item_totals(records)
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals.truncate(top_n);

    let products: Vec<RankedProduct> = totals
        .into_iter()
        .map(|(name, value)| RankedProduct { name, value })
        .collect();
    let total_consumption: f64 = products.iter().map(|p| p.value).sum();

    ProductRankingData {
        products,
        total_consumption,
    }
}

/// Cosmetic/power split for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCategorySplit {
    pub date: DateKey,
    /// Cosmetic consumption
    pub appearance: f64,
    /// Power consumption
    pub value: f64,
    pub total: f64,
}

/// Overall share of each category (0.0 - 1.0)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryProportion {
    pub appearance: f64,
    pub value: f64,
}

/// Category totals across the whole file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub appearance: f64,
    pub value: f64,
    pub total: f64,
}

/// Cosmetic vs power spending over time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductConsumptionAnalysis {
    /// Dates that carry positive consumption, ascending
    pub dates: Vec<DateKey>,
    pub daily_data: Vec<DailyCategorySplit>,
    pub total: CategoryTotals,
    pub proportion: CategoryProportion,
}

/// Split positive consumption into cosmetic and power categories per day.
///
/// Days with no positive consumption are left out of the daily series.
pub fn analyze_product_categories(records: &[Record]) -> ProductConsumptionAnalysis {
    let groups = group_by_date(records);
    let mut daily_data = Vec::new();
    let mut total = CategoryTotals::default();

    for (date, day) in &groups {
        let mut appearance = 0.0;
        let mut value = 0.0;

        for record in day {
            let amount = record.number(Field::Amount);
            if amount <= 0.0 {
                continue;
            }
            match CosmeticPolicy::classify(record) {
                ProductCategory::Cosmetic => appearance += amount,
                ProductCategory::Power => value += amount,
            }
        }

        let day_total = appearance + value;
        if day_total == 0.0 {
            continue;
        }

        total.appearance += appearance;
        total.value += value;
        daily_data.push(DailyCategorySplit {
            date: date.clone(),
            appearance,
            value,
            total: day_total,
        });
    }

    total.total = total.appearance + total.value;
    let proportion = if total.total > 0.0 {
        CategoryProportion {
            appearance: total.appearance / total.total,
            value: total.value / total.total,
        }
    } else {
        CategoryProportion::default()
    };

    ProductConsumptionAnalysis {
        dates: daily_data.iter().map(|d| d.date.clone()).collect(),
        daily_data,
        total,
        proportion,
    }
}

/// One tier's share of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierShare {
    pub tier: PaymentTier,
    pub value: f64,
    /// Share of the item's total (0.0 - 1.0)
    pub percentage: f64,
}

/// Who buys an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTierBreakdown {
    pub name: String,
    pub total: f64,
    /// Tiers with non-zero consumption, descending by value
    pub tiers: Vec<TierShare>,
}

/// Per-item consumption split by payment tier, items descending by total
pub fn item_tier_breakdown(records: &[Record]) -> Vec<ItemTierBreakdown> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<(String, [f64; 5], f64)> = Vec::new();

    for record in records {
        let name = item_label(record);
        let amount = record.number(Field::Amount);
        let slot = match index.get(&name) {
            Some(&i) => i,
            None => {
                index.insert(name.clone(), items.len());
                items.push((name, [0.0; 5], 0.0));
                items.len() - 1
            }
        };

        items[slot].2 += amount;
        if let Some(tier) = record.payment_tier() {
            // ALL is declared in enum order
            items[slot].1[tier as usize] += amount;
        }
    }

    let mut breakdown: Vec<ItemTierBreakdown> = items
        .into_iter()
        .map(|(name, per_tier, total)| {
            let mut tiers: Vec<TierShare> = PaymentTier::ALL
                .into_iter()
                .zip(per_tier)
                .filter(|(_, value)| *value != 0.0)
                .map(|(tier, value)| TierShare {
                    tier,
                    value,
                    percentage: if total != 0.0 { value / total } else { 0.0 },
                })
                .collect();
            tiers.sort_by(|a, b| b.value.total_cmp(&a.value));

            ItemTierBreakdown { name, total, tiers }
        })
        .collect();

    breakdown.sort_by(|a, b| b.total.total_cmp(&a.total));
    breakdown
}
