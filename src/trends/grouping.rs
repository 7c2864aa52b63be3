//! Record grouping
//!
//! Pure partitioning helpers shared by every analysis. Records are borrowed,
//! never copied or mutated.

use std::collections::{BTreeMap, HashMap};

use super::TrendPoint;
use crate::models::{DateKey, Field, PaymentTier, Record, TierBucket};

/// Label used when a record carries no channel
pub const UNKNOWN_CHANNEL: &str = "Unknown";

/// Records bucketed by canonical date, in ascending date order
pub type DateGroups<'a> = BTreeMap<DateKey, Vec<&'a Record>>;

/// Bucket records by canonical date.
///
/// Records whose date is missing or cannot be parsed are dropped.
pub fn group_by_date(records: &[Record]) -> DateGroups<'_> {
    let mut groups: DateGroups<'_> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in records {
        let key = record
            .label(Field::Date)
            .and_then(|raw| DateKey::canonicalize(&raw));

        match key {
            Some(key) => groups.entry(key).or_default().push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} records without a usable date", dropped);
    }

    groups
}

/// Bucket records by their literal tier label
pub fn group_by_payment_tier(records: &[Record]) -> BTreeMap<TierBucket, Vec<&Record>> {
    let mut groups: BTreeMap<TierBucket, Vec<&Record>> = BTreeMap::new();

    for record in records {
        let label = record.label(Field::PaymentTier).unwrap_or_default();
        groups
            .entry(TierBucket::from_label(&label))
            .or_default()
            .push(record);
    }

    groups
}

/// Bucket records by channel label, in first-encounter order
pub fn group_by_channel(records: &[Record]) -> Vec<(String, Vec<&Record>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Record>)> = Vec::new();

    for record in records {
        let channel = channel_label(record);
        match index.get(&channel) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(channel.clone(), groups.len());
                groups.push((channel, vec![record]));
            }
        }
    }

    groups
}

/// Channel of a record, or [`UNKNOWN_CHANNEL`]
pub fn channel_label(record: &Record) -> String {
    record
        .label(Field::Channel)
        .map(|c| c.into_owned())
        .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string())
}

/// Whether a record passes an optional tier filter
pub fn matches_tier(record: &Record, tier: Option<PaymentTier>) -> bool {
    match tier {
        Some(tier) => record.payment_tier() == Some(tier),
        None => true,
    }
}

/// Per-date sum of a numeric field, optionally restricted to one tier.
///
/// Every date in `groups` yields a point, even when the filter leaves it empty.
pub fn daily_sums(groups: &DateGroups<'_>, field: Field, tier: Option<PaymentTier>) -> Vec<TrendPoint> {
    groups
        .iter()
        .map(|(date, records)| {
            let value: f64 = records
                .iter()
                .filter(|r| matches_tier(r, tier))
                .map(|r| r.number(field))
                .sum();
            TrendPoint::new(date.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, tier: &str, channel: &str, amount: &str) -> Record {
        Record::from_raw_pairs(&[
            ("Date", date),
            ("Payment Tier", tier),
            ("Channel", channel),
            ("Amount", amount),
        ])
    }

    #[test]
    fn test_group_by_date_merges_formats_and_sorts() {
        let records = vec![
            record("18/4/2025", "土豪", "Mall", "1"),
            record("2025/4/17", "土豪", "Mall", "2"),
            record("2025-04-17", "平民", "Mall", "3"),
        ];

        let groups = group_by_date(&records);
        let keys: Vec<&str> = groups.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["2025-04-17", "2025-04-18"]);
        assert_eq!(groups.values().next().unwrap().len(), 2);
    }

    #[test]
    fn test_group_by_date_drops_bad_dates() {
        let records = vec![
            record("not a date", "土豪", "Mall", "1"),
            record("", "土豪", "Mall", "1"),
            record("2025-04-17", "土豪", "Mall", "1"),
        ];
        let groups = group_by_date(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.values().map(|v| v.len()).sum::<usize>(), 1);
    }

    #[test]
    fn test_group_by_payment_tier_keeps_unknown() {
        let records = vec![
            record("2025-04-17", "土豪", "Mall", "1"),
            record("2025-04-17", "VIP", "Mall", "1"),
            record("2025-04-17", "Whale", "Mall", "1"),
        ];

        let groups = group_by_payment_tier(&records);
        assert_eq!(groups[&TierBucket::Known(PaymentTier::Whale)].len(), 2);
        assert_eq!(groups[&TierBucket::Unrecognized("VIP".to_string())].len(), 1);
    }

    #[test]
    fn test_group_by_channel_preserves_encounter_order() {
        let records = vec![
            record("2025-04-17", "土豪", "Lottery", "1"),
            record("2025-04-17", "土豪", "Mall", "1"),
            record("2025-04-17", "土豪", "Lottery", "1"),
            record("2025-04-17", "土豪", "", "1"),
        ];

        let groups = group_by_channel(&records);
        let names: Vec<&str> = groups.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Lottery", "Mall", UNKNOWN_CHANNEL]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_daily_sums_with_tier_filter() {
        let records = vec![
            record("2025-04-17", "土豪", "Mall", "1000"),
            record("2025-04-17", "平民", "Mall", "200"),
            record("2025-04-18", "平民", "Mall", "300"),
        ];
        let groups = group_by_date(&records);

        let total = daily_sums(&groups, Field::Amount, None);
        assert_eq!(total.iter().map(|p| p.value).collect::<Vec<_>>(), vec![1200.0, 300.0]);

        let whale = daily_sums(&groups, Field::Amount, Some(PaymentTier::Whale));
        assert_eq!(whale.len(), 2);
        assert_eq!(whale[0].value, 1000.0);
        assert_eq!(whale[1].value, 0.0);
    }

    #[test]
    fn test_grouping_does_not_mutate_input() {
        let records = vec![record("2025-04-17", "土豪", "Mall", "1")];
        let before = records.clone();
        let _ = group_by_date(&records);
        let _ = group_by_payment_tier(&records);
        let _ = group_by_channel(&records);
        assert_eq!(records, before);
    }
}
