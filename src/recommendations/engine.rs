//! Recommendation engine
//!
//! Turns report figures into prioritised, actionable recommendations.

use super::types::{Recommendation, RecommendationInput, RecommendationSummary, RecommendationType};
use crate::trends::TrendDirection;

/// Thresholds for recommendation triggers
mod thresholds {
    /// Growth rate (percent) below this triggers a revenue trend warning
    pub const DECLINE_GROWTH_RATE: f64 = -10.0;
    /// Whale share of consumption above this triggers a dependence warning
    pub const HIGH_WHALE_SHARE: f64 = 0.5;
    /// Cosmetic share below this suggests more appearance content
    pub const LOW_COSMETIC_SHARE: f64 = 0.2;
    /// Cosmetic share above this suggests more value content
    pub const HIGH_COSMETIC_SHARE: f64 = 0.8;
    /// Combined top-K item share above this triggers a concentration warning
    pub const HIGH_TOP_ITEM_SHARE: f64 = 0.6;
    /// Coefficient of variation above this counts as volatile
    pub const HIGH_VOLATILITY: f64 = 0.5;
    /// Volatility needs at least this many days to be meaningful
    pub const MIN_DAYS_FOR_VOLATILITY: usize = 3;
    /// Free user share of purchasers below this triggers an engagement warning
    pub const LOW_FREE_USER_BUYER_SHARE: f64 = 0.2;
}

/// Generate recommendations from report figures
pub fn generate_recommendations(input: &RecommendationInput) -> RecommendationSummary {
    if input.total_consumption <= 0.0 {
        return RecommendationSummary::default();
    }

    let checks: [fn(&RecommendationInput) -> Option<Recommendation>; 6] = [
        check_declining_trend,
        check_whale_dependence,
        check_category_mix,
        check_item_concentration,
        check_volatility,
        check_free_user_engagement,
    ];

    let recommendations = checks.iter().filter_map(|check| check(input)).collect();
    RecommendationSummary::from_recommendations(recommendations)
}

/// Check for falling overall consumption
fn check_declining_trend(input: &RecommendationInput) -> Option<Recommendation> {
    if input.direction != TrendDirection::Decreasing
        || input.growth_rate >= thresholds::DECLINE_GROWTH_RATE
    {
        return None;
    }

    let confidence = if input.days >= 7 { 0.9 } else { 0.6 };

    Some(Recommendation::new(
        RecommendationType::RevenueTrend,
        "Reverse the consumption decline".to_string(),
        format!(
            "Daily Tianyu consumption fell {:.1}% from the first to the last day of the period. \
            Review recent content and event cadence for the cause.",
            -input.growth_rate
        ),
        -input.growth_rate / 50.0,
        confidence,
        vec![
            "Schedule a limited-time event to re-activate spending".to_string(),
            "Compare the release calendar against the days with the sharpest drops".to_string(),
            "Check whether a recent price or drop-rate change coincides with the decline".to_string(),
        ],
        format!(
            "Growth rate: {:.1}% over {} days (threshold: {:.0}%)",
            input.growth_rate,
            input.days,
            thresholds::DECLINE_GROWTH_RATE
        ),
    ))
}

/// Check whether revenue leans too heavily on the top tier
fn check_whale_dependence(input: &RecommendationInput) -> Option<Recommendation> {
    if input.whale_share <= thresholds::HIGH_WHALE_SHARE {
        return None;
    }

    Some(Recommendation::new(
        RecommendationType::WhaleDependence,
        "Reduce dependence on whale spending".to_string(),
        format!(
            "Whales account for {:.1}% of all consumption. Losing a few of them would move \
            total revenue noticeably.",
            input.whale_share * 100.0
        ),
        (input.whale_share - thresholds::HIGH_WHALE_SHARE) * 2.0,
        0.8,
        vec![
            "Add mid-priced bundles aimed at big and mid spenders".to_string(),
            "Introduce retention rewards for the top spenders".to_string(),
            "Track whale activity daily to catch churn early".to_string(),
        ],
        format!(
            "Whale share: {:.1}% (threshold: {:.0}%)",
            input.whale_share * 100.0,
            thresholds::HIGH_WHALE_SHARE * 100.0
        ),
    ))
}

/// Check the cosmetic / power balance
fn check_category_mix(input: &RecommendationInput) -> Option<Recommendation> {
    let share = input.cosmetic_share;

    let (title, description, severity, action_items) = if share < thresholds::LOW_COSMETIC_SHARE {
        (
            "Grow appearance spending",
            format!(
                "Only {:.1}% of consumption goes to appearance items. Spending is concentrated on \
                power progression.",
                share * 100.0
            ),
            (thresholds::LOW_COSMETIC_SHARE - share) / thresholds::LOW_COSMETIC_SHARE,
            vec![
                "Release new costumes alongside major updates".to_string(),
                "Feature appearance items in the monthly lottery".to_string(),
            ],
        )
    } else if share > thresholds::HIGH_COSMETIC_SHARE {
        (
            "Strengthen value item offers",
            format!(
                "{:.1}% of consumption goes to appearance items. Power progression offers are \
                attracting little spending.",
                share * 100.0
            ),
            (share - thresholds::HIGH_COSMETIC_SHARE) / (1.0 - thresholds::HIGH_COSMETIC_SHARE),
            vec![
                "Review the price of progression items".to_string(),
                "Bundle value items with popular appearance items".to_string(),
            ],
        )
    } else {
        return None;
    };

    Some(Recommendation::new(
        RecommendationType::CategoryMix,
        title.to_string(),
        description,
        severity,
        0.7,
        action_items,
        format!("Appearance share: {:.1}%", share * 100.0),
    ))
}

/// Check whether a few items dominate spending
fn check_item_concentration(input: &RecommendationInput) -> Option<Recommendation> {
    if input.top_item_count == 0 || input.top_item_share <= thresholds::HIGH_TOP_ITEM_SHARE {
        return None;
    }

    Some(Recommendation::new(
        RecommendationType::ItemConcentration,
        "Broaden the item catalogue".to_string(),
        format!(
            "The top {} items take {:.1}% of all consumption. Demand is concentrated on very few products.",
            input.top_item_count,
            input.top_item_share * 100.0
        ),
        (input.top_item_share - thresholds::HIGH_TOP_ITEM_SHARE) / (1.0 - thresholds::HIGH_TOP_ITEM_SHARE),
        0.75,
        vec![
            "Rotate featured items in the shop".to_string(),
            "Create alternatives to the best sellers at different price points".to_string(),
        ],
        format!(
            "Top {} item share: {:.1}% (threshold: {:.0}%)",
            input.top_item_count,
            input.top_item_share * 100.0,
            thresholds::HIGH_TOP_ITEM_SHARE * 100.0
        ),
    ))
}

/// Check for large day-to-day swings
fn check_volatility(input: &RecommendationInput) -> Option<Recommendation> {
    if input.days < thresholds::MIN_DAYS_FOR_VOLATILITY
        || input.coefficient_of_variation <= thresholds::HIGH_VOLATILITY
    {
        return None;
    }

    Some(Recommendation::new(
        RecommendationType::Volatility,
        "Smooth out daily consumption".to_string(),
        format!(
            "Daily consumption varies by {:.0}% of its mean. Spending is driven by spikes rather \
            than steady demand.",
            input.coefficient_of_variation * 100.0
        ),
        input.coefficient_of_variation - thresholds::HIGH_VOLATILITY,
        0.6,
        vec![
            "Spread events more evenly across the calendar".to_string(),
            "Add daily or weekly purchase incentives".to_string(),
        ],
        format!(
            "Coefficient of variation: {:.2} over {} days",
            input.coefficient_of_variation, input.days
        ),
    ))
}

/// Check free user participation in purchases
fn check_free_user_engagement(input: &RecommendationInput) -> Option<Recommendation> {
    if input.total_buyers <= 0.0 || input.free_user_buyer_share >= thresholds::LOW_FREE_USER_BUYER_SHARE {
        return None;
    }

    Some(Recommendation::new(
        RecommendationType::FreeUserEngagement,
        "Convert more free users".to_string(),
        format!(
            "Free users make up only {:.1}% of purchasers.",
            input.free_user_buyer_share * 100.0
        ),
        (thresholds::LOW_FREE_USER_BUYER_SHARE - input.free_user_buyer_share)
            / thresholds::LOW_FREE_USER_BUYER_SHARE,
        0.65,
        vec![
            "Offer a low-priced first purchase pack".to_string(),
            "Grant small amounts of Tianyu through daily activities".to_string(),
        ],
        format!(
            "Free user buyer share: {:.1}% (threshold: {:.0}%)",
            input.free_user_buyer_share * 100.0,
            thresholds::LOW_FREE_USER_BUYER_SHARE * 100.0
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_input() -> RecommendationInput {
        RecommendationInput {
            days: 14,
            total_consumption: 100_000.0,
            direction: TrendDirection::Increasing,
            growth_rate: 5.0,
            whale_share: 0.3,
            cosmetic_share: 0.5,
            top_item_share: 0.4,
            top_item_count: 5,
            coefficient_of_variation: 0.2,
            free_user_buyer_share: 0.5,
            total_buyers: 1_000.0,
        }
    }

    fn has(summary: &RecommendationSummary, rec_type: RecommendationType) -> bool {
        summary.recommendations.iter().any(|r| r.rec_type == rec_type)
    }

    #[test]
    fn test_generate_recommendations_normal_metrics() {
        let summary = generate_recommendations(&create_test_input());
        assert!(summary.is_empty());
    }

    #[test]
    fn test_declining_trend_recommendation() {
        let mut input = create_test_input();
        input.direction = TrendDirection::Decreasing;
        input.growth_rate = -75.0;

        let summary = generate_recommendations(&input);
        let rec = summary
            .recommendations
            .iter()
            .find(|r| r.rec_type == RecommendationType::RevenueTrend)
            .unwrap();
        assert_eq!(rec.severity, 1.0);
        assert!(!rec.action_items.is_empty());
    }

    #[test]
    fn test_small_decline_is_ignored() {
        let mut input = create_test_input();
        input.direction = TrendDirection::Decreasing;
        input.growth_rate = -5.0;
        assert!(!has(&generate_recommendations(&input), RecommendationType::RevenueTrend));
    }

    #[test]
    fn test_whale_dependence_recommendation() {
        let mut input = create_test_input();
        input.whale_share = 0.85;
        assert!(has(&generate_recommendations(&input), RecommendationType::WhaleDependence));
    }

    #[test]
    fn test_category_mix_both_directions() {
        let mut input = create_test_input();
        input.cosmetic_share = 0.05;
        let summary = generate_recommendations(&input);
        assert_eq!(summary.recommendations[0].title, "Grow appearance spending");

        input.cosmetic_share = 0.95;
        let summary = generate_recommendations(&input);
        assert_eq!(summary.recommendations[0].title, "Strengthen value item offers");
    }

    #[test]
    fn test_item_concentration_and_volatility() {
        let mut input = create_test_input();
        input.top_item_share = 0.9;
        input.coefficient_of_variation = 1.2;
        let summary = generate_recommendations(&input);
        assert!(has(&summary, RecommendationType::ItemConcentration));
        assert!(has(&summary, RecommendationType::Volatility));

        input.days = 2;
        assert!(!has(&generate_recommendations(&input), RecommendationType::Volatility));
    }

    #[test]
    fn test_free_user_engagement() {
        let mut input = create_test_input();
        input.free_user_buyer_share = 0.05;
        assert!(has(&generate_recommendations(&input), RecommendationType::FreeUserEngagement));

        input.total_buyers = 0.0;
        assert!(!has(&generate_recommendations(&input), RecommendationType::FreeUserEngagement));
    }

    #[test]
    fn test_recommendations_sorted_by_priority() {
        let mut input = create_test_input();
        input.direction = TrendDirection::Decreasing;
        input.growth_rate = -60.0;
        input.coefficient_of_variation = 0.6;

        let summary = generate_recommendations(&input);
        assert_eq!(summary.recommendations.len(), 2);
        assert_eq!(summary.recommendations[0].rec_type, RecommendationType::RevenueTrend);
        assert!(summary.recommendations[0].priority_score >= summary.recommendations[1].priority_score);
    }

    #[test]
    fn test_no_data_no_recommendations() {
        let input = RecommendationInput::default();
        assert!(generate_recommendations(&input).is_empty());
    }
}
