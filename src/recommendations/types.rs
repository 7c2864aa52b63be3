//! Recommendation types
//!
//! Data structures for operational recommendations derived from a spending report.

use serde::{Deserialize, Serialize};

use crate::trends::TrendDirection;

/// Type of recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    /// Overall consumption is falling
    RevenueTrend,
    /// Too much consumption comes from the top tier
    WhaleDependence,
    /// Cosmetic vs power mix is lopsided
    CategoryMix,
    /// A handful of items carry most of the spending
    ItemConcentration,
    /// Daily consumption swings sharply
    Volatility,
    /// Few free users take part in purchases
    FreeUserEngagement,
}

impl RecommendationType {
    /// Get display label for the recommendation type
    pub fn label(&self) -> &'static str {
        match self {
            Self::RevenueTrend => "Revenue Trend",
            Self::WhaleDependence => "Whale Dependence",
            Self::CategoryMix => "Category Mix",
            Self::ItemConcentration => "Item Concentration",
            Self::Volatility => "Volatility",
            Self::FreeUserEngagement => "Free User Engagement",
        }
    }

    /// Get priority weight (higher = more important)
    pub fn priority_weight(&self) -> f64 {
        match self {
            Self::RevenueTrend => 1.0,
            Self::WhaleDependence => 0.9,
            Self::ItemConcentration => 0.8,
            Self::CategoryMix => 0.75,
            Self::FreeUserEngagement => 0.7,
            Self::Volatility => 0.6,
        }
    }
}

/// Priority bucket shown next to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Bucket for a priority score
    pub fn from_score(score: f64) -> Self {
        if score >= 0.6 {
            Self::High
        } else if score >= 0.35 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// A single recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Type of recommendation
    pub rec_type: RecommendationType,
    /// Short title for the recommendation
    pub title: String,
    /// Detailed description explaining the recommendation
    pub description: String,
    /// How far past its threshold the triggering metric is (0.0 - 1.0)
    pub severity: f64,
    /// Confidence level (0.0 - 1.0)
    pub confidence: f64,
    /// Specific action items to implement this recommendation
    pub action_items: Vec<String>,
    /// What data/metrics this recommendation is based on
    pub based_on: String,
    /// Priority score for sorting (computed from type + severity + confidence)
    pub priority_score: f64,
    pub priority: Priority,
}

impl Recommendation {
    /// Create a new recommendation with computed priority
    pub fn new(
        rec_type: RecommendationType,
        title: String,
        description: String,
        severity: f64,
        confidence: f64,
        action_items: Vec<String>,
        based_on: String,
    ) -> Self {
        let severity = severity.clamp(0.0, 1.0);
        let priority_score = rec_type.priority_weight() * confidence * (0.5 + 0.5 * severity);

        Self {
            rec_type,
            title,
            description,
            severity,
            confidence,
            action_items,
            based_on,
            priority_score,
            priority: Priority::from_score(priority_score),
        }
    }
}

/// All recommendations for one report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationSummary {
    /// All recommendations sorted by priority
    pub recommendations: Vec<Recommendation>,
    /// Top priority recommendation (if any)
    pub top_priority: Option<Recommendation>,
    pub high_priority_count: u32,
    /// Average confidence across all recommendations
    pub avg_confidence: f64,
}

impl RecommendationSummary {
    /// Create a new summary from a list of recommendations
    pub fn from_recommendations(mut recommendations: Vec<Recommendation>) -> Self {
        recommendations.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));

        let high_priority_count = recommendations
            .iter()
            .filter(|r| r.priority == Priority::High)
            .count() as u32;

        let avg_confidence = if recommendations.is_empty() {
            0.0
        } else {
            recommendations.iter().map(|r| r.confidence).sum::<f64>() / recommendations.len() as f64
        };

        let top_priority = recommendations.first().cloned();

        Self {
            recommendations,
            top_priority,
            high_priority_count,
            avg_confidence,
        }
    }

    /// Limit to top N recommendations
    pub fn limit(mut self, n: usize) -> Self {
        self.recommendations.truncate(n);
        Self::from_recommendations(self.recommendations)
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Report figures the rules look at
#[derive(Debug, Clone, Default)]
pub struct RecommendationInput {
    /// Number of dates in the overall trend
    pub days: usize,
    pub total_consumption: f64,
    pub direction: TrendDirection,
    /// First-to-last change in percent
    pub growth_rate: f64,
    /// Whale share of total consumption (0.0 - 1.0)
    pub whale_share: f64,
    /// Cosmetic share of positive consumption (0.0 - 1.0)
    pub cosmetic_share: f64,
    /// Combined share of the top-K items (0.0 - 1.0)
    pub top_item_share: f64,
    pub top_item_count: usize,
    /// Standard deviation over mean of daily consumption
    pub coefficient_of_variation: f64,
    /// Free user share of all purchasers (0.0 - 1.0)
    pub free_user_buyer_share: f64,
    pub total_buyers: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(rec_type: RecommendationType, severity: f64, confidence: f64) -> Recommendation {
        Recommendation::new(
            rec_type,
            "title".to_string(),
            "description".to_string(),
            severity,
            confidence,
            vec![],
            String::new(),
        )
    }

    #[test]
    fn test_priority_score_and_bucket() {
        let high = rec(RecommendationType::RevenueTrend, 1.0, 0.9);
        assert!((high.priority_score - 0.9).abs() < 1e-9);
        assert_eq!(high.priority, Priority::High);

        let low = rec(RecommendationType::Volatility, 0.0, 0.5);
        assert!((low.priority_score - 0.15).abs() < 1e-9);
        assert_eq!(low.priority, Priority::Low);
    }

    #[test]
    fn test_severity_is_clamped() {
        let r = rec(RecommendationType::CategoryMix, 4.0, 1.0);
        assert_eq!(r.severity, 1.0);
    }

    #[test]
    fn test_summary_sorted_by_score() {
        let summary = RecommendationSummary::from_recommendations(vec![
            rec(RecommendationType::Volatility, 0.2, 0.6),
            rec(RecommendationType::RevenueTrend, 0.8, 0.9),
        ]);

        assert_eq!(summary.recommendations[0].rec_type, RecommendationType::RevenueTrend);
        assert_eq!(
            summary.top_priority.as_ref().map(|r| r.rec_type),
            Some(RecommendationType::RevenueTrend)
        );
        assert!((summary.avg_confidence - 0.75).abs() < 1e-9);
        assert_eq!(summary.high_priority_count, 1);

        let limited = summary.limit(1);
        assert_eq!(limited.recommendations.len(), 1);
    }

    #[test]
    fn test_priority_serializes_snake_case() {
        let json = serde_json::to_string(&Priority::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
