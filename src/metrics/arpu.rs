//! Revenue per active user
//!
//! The export repeats the daily active user count of a tier on every row of
//! that tier and day, so DAU is taken once per `(date, tier)` as the largest
//! value reported there.

use serde::{Deserialize, Serialize};

use crate::models::{DateKey, Field, PaymentTier, Record};
use crate::trends::grouping::{group_by_date, DateGroups};

/// ARPU of one payment tier over the whole file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierArpu {
    pub tier: PaymentTier,
    pub consumption: f64,
    /// Sum over dates of the tier's daily DAU
    pub dau: f64,
    pub arpu: f64,
}

/// ARPU of one day across all tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyArpu {
    pub date: DateKey,
    pub consumption: f64,
    pub dau: f64,
    pub arpu: f64,
}

/// Result of [`analyze_arpu`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArpuAnalysis {
    /// One entry per tier, Whale first
    pub tiers: Vec<TierArpu>,
    pub daily: Vec<DailyArpu>,
    pub overall_arpu: f64,
    /// False when the export has no usable DAU column
    pub has_dau: bool,
}

impl ArpuAnalysis {
    pub fn tier(&self, tier: PaymentTier) -> Option<&TierArpu> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

fn ratio(consumption: f64, dau: f64) -> f64 {
    if dau > 0.0 {
        consumption / dau
    } else {
        0.0
    }
}

/// Consumption and DAU of one tier on one date
fn day_tier_totals(day: &[&Record], tier: PaymentTier) -> (f64, f64) {
    day.iter()
        .filter(|r| r.payment_tier() == Some(tier))
        .fold((0.0, 0.0), |(consumption, dau), r| {
            (consumption + r.number(Field::Amount), f64::max(dau, r.number(Field::Dau)))
        })
}

fn tier_rows(groups: &DateGroups<'_>) -> Vec<Vec<(f64, f64)>> {
    groups
        .values()
        .map(|day| PaymentTier::ALL.into_iter().map(|t| day_tier_totals(day, t)).collect())
        .collect()
}

/// Per-tier and per-day ARPU for records with recognised tiers
pub fn analyze_arpu(records: &[Record]) -> ArpuAnalysis {
    let groups = group_by_date(records);
    let rows = tier_rows(&groups);

    let tiers: Vec<TierArpu> = PaymentTier::ALL
        .into_iter()
        .enumerate()
        .map(|(i, tier)| {
            let consumption: f64 = rows.iter().map(|row| row[i].0).sum();
            let dau: f64 = rows.iter().map(|row| row[i].1).sum();
            TierArpu {
                tier,
                consumption,
                dau,
                arpu: ratio(consumption, dau),
            }
        })
        .collect();

    let daily: Vec<DailyArpu> = groups
        .keys()
        .zip(&rows)
        .map(|(date, row)| {
            let consumption: f64 = row.iter().map(|(c, _)| c).sum();
            let dau: f64 = row.iter().map(|(_, d)| d).sum();
            DailyArpu {
                date: date.clone(),
                consumption,
                dau,
                arpu: ratio(consumption, dau),
            }
        })
        .collect();

    let consumption: f64 = tiers.iter().map(|t| t.consumption).sum();
    let dau: f64 = tiers.iter().map(|t| t.dau).sum();

    ArpuAnalysis {
        tiers,
        daily,
        overall_arpu: ratio(consumption, dau),
        has_dau: dau > 0.0,
    }
}
