//! Narrative HTML fragments
//!
//! Short explanatory paragraphs shown beside each chart. Every figure quoted
//! here comes from the same aggregates the charts are built from.

use crate::metrics::format_large_number;
use crate::metrics::product::ItemTierBreakdown;
use crate::metrics::{ArpuAnalysis, ChannelAnalysis, ProductConsumptionAnalysis, ProductRankingData};
use crate::recommendations::RecommendationSummary;
use crate::trends::{BuyersTrend, ConsumptionTrend};

use super::{SummaryStats, ERROR_MESSAGE};

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn consumption_trend(trend: &ConsumptionTrend, stats: &SummaryStats) -> String {
    let total = &trend.total;
    if total.is_empty() {
        return "<p>No dated consumption was found in this file.</p>".to_string();
    }

    let mut html = format!(
        "<p>Over <strong>{}</strong> days players consumed <strong>{}</strong> Tianyu in total, \
        an average of {} per day. The overall trend is <strong>{}</strong> ({:+.1}% from the first to the last day).</p>",
        stats.days,
        format_large_number(stats.total_consumption),
        format_large_number(total.mean),
        stats.direction.label(),
        stats.growth_rate,
    );

    if let (Some(max), Some(min)) = (&total.max, &total.min) {
        html.push_str(&format!(
            "<p>Peak day was {} with {}; the quietest day was {} with {}.</p>",
            max.date,
            format_large_number(max.value),
            min.date,
            format_large_number(min.value),
        ));
    }

    if let Some(tier) = stats.top_tier {
        html.push_str(&format!(
            "<p><strong>{}</strong> ({}) has the highest average daily consumption at {}.</p>",
            tier.display_name(),
            tier.source_label(),
            format_large_number(stats.top_tier_mean),
        ));
    }

    html
}

pub fn buyers_trend(buyers: &BuyersTrend) -> String {
    if buyers.dates.is_empty() {
        return "<p>No purchaser counts were found in this file.</p>".to_string();
    }

    let total: f64 = buyers.total_buyers.iter().sum();
    let average = total / buyers.dates.len() as f64;
    let mut html = format!(
        "<p>On average <strong>{}</strong> players made purchases each day.</p><ul>",
        format_large_number(average.round()),
    );
    for tier in &buyers.buyers_by_tier {
        let tier_total: f64 = tier.values.iter().sum();
        let share = if total > 0.0 { tier_total / total } else { 0.0 };
        html.push_str(&format!(
            "<li>{}: {} ({})</li>",
            tier.tier.display_name(),
            format_large_number(tier_total),
            percent(share),
        ));
    }
    html.push_str("</ul>");
    html
}

pub fn channel_breakdown(analysis: &ChannelAnalysis) -> String {
    let grand_total: f64 = analysis.consumption_data.iter().map(|d| d.total_consumption).sum();
    if grand_total <= 0.0 {
        return "<p>No tier consumption was found in this file.</p>".to_string();
    }

    let named: Vec<String> = analysis
        .main_channels
        .iter()
        .map(|c| escape(c))
        .collect();
    let mut html = format!(
        "<p>Main consumption channels: {}.</p><ul>",
        named.join(", ")
    );
    for data in &analysis.consumption_data {
        html.push_str(&format!(
            "<li>{}: {} Tianyu ({}), {} per purchaser</li>",
            data.user_group.display_name(),
            format_large_number(data.total_consumption),
            percent(data.total_consumption / grand_total),
            format_large_number(data.avg_consumption),
        ));
    }
    html.push_str("</ul>");
    html
}

pub fn product_ranking(ranking: &ProductRankingData, item_tiers: &[ItemTierBreakdown]) -> String {
    let Some(top) = ranking.products.first() else {
        return "<p>No item consumption was found in this file.</p>".to_string();
    };

    let mut html = format!(
        "<p>The best-selling item is <strong>{}</strong> with {} Tianyu. The top {} items account for {} Tianyu.</p>",
        escape(&top.name),
        format_large_number(top.value),
        ranking.products.len(),
        format_large_number(ranking.total_consumption),
    );

    let main_buyer = item_tiers
        .iter()
        .find(|item| item.name == top.name)
        .and_then(|item| item.tiers.first());
    if let Some(share) = main_buyer {
        html.push_str(&format!(
            "<p>{} buy {} of it.</p>",
            share.tier.display_name(),
            percent(share.percentage),
        ));
    }

    html
}

pub fn category_split(analysis: &ProductConsumptionAnalysis) -> String {
    if analysis.total.total <= 0.0 {
        return "<p>No positive consumption to classify.</p>".to_string();
    }

    format!(
        "<p>Appearance items took <strong>{}</strong> ({}) and value items <strong>{}</strong> ({}) \
        across {} days with spending.</p>",
        format_large_number(analysis.total.appearance),
        percent(analysis.proportion.appearance),
        format_large_number(analysis.total.value),
        percent(analysis.proportion.value),
        analysis.daily_data.len(),
    )
}

pub fn arpu(analysis: &ArpuAnalysis) -> String {
    if !analysis.has_dau {
        return "<p>The file carries no DAU column, so revenue per active user is unavailable.</p>".to_string();
    }

    let mut html = format!(
        "<p>Overall revenue per daily active user is <strong>{:.2}</strong> Tianyu.</p><ul>",
        analysis.overall_arpu
    );
    for tier in &analysis.tiers {
        html.push_str(&format!(
            "<li>{}: {:.2}</li>",
            tier.tier.display_name(),
            tier.arpu
        ));
    }
    html.push_str("</ul>");
    html
}

/// Summary text used when no generated narrative is available
pub fn fallback_summary(stats: &SummaryStats, recommendations: &RecommendationSummary) -> String {
    let mut text = format!(
        "## Overview\n\nTotal consumption over {} days was {} Tianyu; the trend is {} ({:+.1}%).\n",
        stats.days,
        format_large_number(stats.total_consumption),
        stats.direction.label(),
        stats.growth_rate,
    );

    if !stats.top_items.is_empty() {
        let names: Vec<&str> = stats.top_items.iter().map(|p| p.name.as_str()).collect();
        text.push_str(&format!(
            "\nTop items: {} ({} of all consumption).\n",
            names.join(", "),
            percent(stats.top_items_share),
        ));
    }

    if recommendations.is_empty() {
        text.push_str("\n## Recommendations\n\nNo issues stand out in this period.\n");
        return text;
    }

    text.push_str("\n## Recommendations\n");
    for (i, rec) in recommendations.recommendations.iter().enumerate() {
        text.push_str(&format!(
            "\n{}. **{}** ({} priority): {}\n",
            i + 1,
            rec.title,
            rec.priority.label(),
            rec.description
        ));
        for item in &rec.action_items {
            text.push_str(&format!("   - {}\n", item));
        }
    }
    text
}

/// Paragraph shown in every section of the degenerate report
pub fn error_message() -> String {
    format!("<p>{}</p>", ERROR_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::product::RankedProduct;
    use crate::trends::TrendDirection;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>A&B</b>"), "&lt;b&gt;A&amp;B&lt;/b&gt;");
    }

    #[test]
    fn test_empty_inputs_have_placeholders() {
        assert!(consumption_trend(&ConsumptionTrend::default(), &SummaryStats::default()).contains("No dated"));
        assert!(buyers_trend(&BuyersTrend::default()).contains("No purchaser"));
        assert!(product_ranking(&ProductRankingData::default(), &[]).contains("No item"));
        assert!(arpu(&ArpuAnalysis::default()).contains("DAU"));
    }

    #[test]
    fn test_fallback_summary_mentions_top_items() {
        let stats = SummaryStats {
            total_consumption: 15_000.0,
            days: 2,
            direction: TrendDirection::Decreasing,
            growth_rate: -75.0,
            top_items: vec![RankedProduct {
                name: "Skin A".to_string(),
                value: 10_000.0,
            }],
            top_items_share: 2.0 / 3.0,
            ..Default::default()
        };
        let text = fallback_summary(&stats, &RecommendationSummary::default());
        assert!(text.contains("1.50万"));
        assert!(text.contains("decreasing (-75.0%)"));
        assert!(text.contains("Skin A"));
        assert!(text.contains("66.7%"));
        assert!(text.contains("No issues stand out"));
    }

    #[test]
    fn test_error_message() {
        assert!(error_message().contains(ERROR_MESSAGE));
    }
}
