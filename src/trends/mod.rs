//! Trend analysis module
//!
//! This module handles the time-series side of the report:
//! - Grouping records by date, payment tier and channel
//! - Trend statistics (OLS trend line, mean, extrema, peaks and valleys)
//! - Daily consumption and purchaser series, overall and per tier

pub mod daily;
pub mod grouping;
pub mod statistics;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{DateKey, PaymentTier};

pub use daily::{analyze_consumption_trend, calculate_daily_buyers, calculate_daily_item_consumption};
pub use grouping::{daily_sums, group_by_channel, group_by_date, group_by_payment_tier};
pub use statistics::{coefficient_of_variation, compute_trend, growth_rate, LinearTrend, TrendDirection};

/// A single `(date, value)` point of a time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: DateKey,
    pub value: f64,
}

impl TrendPoint {
    pub fn new(date: DateKey, value: f64) -> Self {
        Self { date, value }
    }
}

/// One item's contribution to a day's consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemShare {
    pub name: String,
    pub value: f64,
    /// Fraction of the day's total (0.0 - 1.0)
    pub percentage: f64,
}

/// Drill-down data behind one point of a consumption chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDetail {
    pub date: DateKey,
    pub value: f64,
    /// Items ranked by consumption, descending
    pub items: Vec<ItemShare>,
}

/// Statistics derived from one time series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Dates in ascending order
    pub dates: Vec<DateKey>,
    /// Value per date
    pub values: Vec<f64>,
    /// OLS fit evaluated at each point index
    pub trend_values: Vec<f64>,
    /// Slope and intercept of the fit
    pub trend_line: LinearTrend,
    /// Arithmetic mean of `values`
    pub mean: f64,
    /// Highest point (first occurrence on ties); `None` for an empty series
    pub max: Option<TrendPoint>,
    /// Lowest point (first occurrence on ties); `None` for an empty series
    pub min: Option<TrendPoint>,
    /// Significant local maxima, or the global max when none qualify
    pub peaks: Vec<TrendPoint>,
    /// Significant local minima, or the global min when none qualify
    pub valleys: Vec<TrendPoint>,
    /// Per-date item breakdown
    pub point_details: BTreeMap<DateKey, PointDetail>,
}

impl TrendSummary {
    /// Attach drill-down details
    pub fn with_point_details(mut self, point_details: BTreeMap<DateKey, PointDetail>) -> Self {
        self.point_details = point_details;
        self
    }

    /// Whether the series has any points
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all values
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// First value of the series
    pub fn first_value(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Last value of the series
    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Trend of one payment tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTrend {
    pub tier: PaymentTier,
    pub trend: TrendSummary,
}

/// Daily consumption trend, overall and per payment tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionTrend {
    pub total: TrendSummary,
    /// One entry per tier, in display order
    pub tiers: Vec<TierTrend>,
}

impl ConsumptionTrend {
    /// Trend for a single tier
    pub fn tier(&self, tier: PaymentTier) -> Option<&TrendSummary> {
        self.tiers.iter().find(|t| t.tier == tier).map(|t| &t.trend)
    }
}

/// Purchaser counts for one tier across all dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBuyers {
    pub tier: PaymentTier,
    pub values: Vec<f64>,
}

/// Daily purchaser (role count) series, overall and per tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyersTrend {
    pub dates: Vec<DateKey>,
    pub total_buyers: Vec<f64>,
    /// One entry per tier, in display order
    pub buyers_by_tier: Vec<TierBuyers>,
}

impl BuyersTrend {
    /// Series for a single tier
    pub fn tier(&self, tier: PaymentTier) -> Option<&[f64]> {
        self.buyers_by_tier
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.values.as_slice())
    }
}
