//! Channel / payment tier cross-tabulation
//!
//! Consumption and purchaser counts per tier, broken down over the globally
//! largest consumption channels plus an "Other" bucket.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Field, PaymentTier, Record};
use crate::trends::grouping::{channel_label, group_by_channel};

/// Number of channels kept by name; the rest collapse into [`OTHER_CHANNEL`]
pub const MAIN_CHANNEL_COUNT: usize = 4;

/// Synthetic bucket for every channel outside the top [`MAIN_CHANNEL_COUNT`]
pub const OTHER_CHANNEL: &str = "Other";

/// Amount attributed to one channel bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAmount {
    pub channel: String,
    pub amount: f64,
}

/// Consumption of one payment tier across the channel buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConsumptionData {
    pub user_group: PaymentTier,
    /// Consumption per bucket, in `main_channels` order
    pub channel_data: Vec<ChannelAmount>,
    /// Role counts per bucket, in `main_channels` order
    pub channel_purchase: Vec<ChannelAmount>,
    pub total_consumption: f64,
    /// `round(total_consumption / user_count)`, 0 without users
    pub avg_consumption: f64,
    pub user_count: f64,
    pub main_channels: Vec<String>,
}

impl ChannelConsumptionData {
    /// Consumption in one bucket
    pub fn amount(&self, channel: &str) -> f64 {
        self.channel_data
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| c.amount)
            .unwrap_or(0.0)
    }
}

/// Purchaser counts of one payment tier across the channel buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPurchaseData {
    pub user_group: PaymentTier,
    pub channel_purchase: Vec<ChannelAmount>,
    pub user_count: f64,
}

/// Result of [`analyze_channels`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnalysis {
    /// One entry per tier, Whale first
    pub consumption_data: Vec<ChannelConsumptionData>,
    /// One entry per tier, Whale first
    pub purchase_data: Vec<ChannelPurchaseData>,
    /// Top channels by overall consumption, followed by [`OTHER_CHANNEL`]
    pub main_channels: Vec<String>,
}

impl ChannelAnalysis {
    /// Breakdown for a single tier
    pub fn tier(&self, tier: PaymentTier) -> Option<&ChannelConsumptionData> {
        self.consumption_data.iter().find(|d| d.user_group == tier)
    }
}

/// Rank channels by overall consumption and keep the top ones by name.
///
/// Ties keep first-encounter order. "Other" is always appended.
pub fn main_channels(records: &[Record]) -> Vec<String> {
    let mut totals: Vec<(String, f64)> = group_by_channel(records)
        .into_iter()
        .map(|(channel, group)| {
            let total: f64 = group.iter().map(|r| r.number(Field::Amount)).sum();
            (channel, total)
        })
        .collect();

    totals.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut channels: Vec<String> = totals
        .into_iter()
        .map(|(channel, _)| channel)
        .filter(|channel| channel != OTHER_CHANNEL)
        .take(MAIN_CHANNEL_COUNT)
        .collect();
    channels.push(OTHER_CHANNEL.to_string());
    channels
}

/// Fold one field of a tier's records into the channel buckets
fn fold_buckets(records: &[&Record], field: Field, main_channels: &[String]) -> Vec<ChannelAmount> {
    let positions: HashMap<&str, usize> = main_channels
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();
    let other = main_channels.len() - 1;

    let mut buckets: Vec<ChannelAmount> = main_channels
        .iter()
        .map(|channel| ChannelAmount {
            channel: channel.clone(),
            amount: 0.0,
        })
        .collect();

    for record in records {
        let channel = channel_label(record);
        let slot = positions.get(channel.as_str()).copied().unwrap_or(other);
        buckets[slot].amount += record.number(field);
    }

    buckets
}

/// Cross-tabulate consumption and role counts by tier and channel.
///
/// Every tier appears in display order, zeroed when it has no records.
/// Records with unrecognised tier labels only influence the channel ranking.
pub fn analyze_channels(records: &[Record]) -> ChannelAnalysis {
    let main_channels = main_channels(records);

    let mut consumption_data = Vec::with_capacity(PaymentTier::ALL.len());
    let mut purchase_data = Vec::with_capacity(PaymentTier::ALL.len());

    for tier in PaymentTier::ALL {
        let tier_records: Vec<&Record> = records
            .iter()
            .filter(|r| r.payment_tier() == Some(tier))
            .collect();

        let channel_data = fold_buckets(&tier_records, Field::Amount, &main_channels);
        let channel_purchase = fold_buckets(&tier_records, Field::RoleCount, &main_channels);

        let total_consumption: f64 = channel_data.iter().map(|c| c.amount).sum();
        let user_count: f64 = channel_purchase.iter().map(|c| c.amount).sum();
        let avg_consumption = if user_count > 0.0 {
            (total_consumption / user_count).round()
        } else {
            0.0
        };

        purchase_data.push(ChannelPurchaseData {
            user_group: tier,
            channel_purchase: channel_purchase.clone(),
            user_count,
        });
        consumption_data.push(ChannelConsumptionData {
            user_group: tier,
            channel_data,
            channel_purchase,
            total_consumption,
            avg_consumption,
            user_count,
            main_channels: main_channels.clone(),
        });
    }

    tracing::debug!("Channel analysis: main channels {:?}", main_channels);

    ChannelAnalysis {
        consumption_data,
        purchase_data,
        main_channels,
    }
}
