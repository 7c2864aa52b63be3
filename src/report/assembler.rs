//! Report assembler
//!
//! Runs every analysis over one parsed file and merges the results into an
//! [`AnalysisReport`]. Failures never escape: they are logged and replaced by a
//! degenerate report that still has every section list.

use crate::metrics::{
    analyze_arpu, analyze_channels, analyze_product_categories, item_tier_breakdown, rank_products,
    ProductConsumptionAnalysis, DEFAULT_TOP_N,
};
use crate::models::{Field, PaymentTier, Record};
use crate::parser::ParsedTable;
use crate::recommendations::{generate_recommendations, RecommendationInput, RecommendationSummary};
use crate::trends::{
    analyze_consumption_trend, calculate_daily_buyers, coefficient_of_variation, group_by_date, growth_rate,
    BuyersTrend, ConsumptionTrend, TrendDirection,
};

use super::charts::{self, PRIMARY_COLOR};
use super::fragments;
use super::{
    AnalysisError, AnalysisReport, AnalysisResult, ReportSection, SectionData, SummarySection, SummaryStats,
    DEFAULT_TITLE,
};

/// Number of items quoted in the summary by default
pub const DEFAULT_SUMMARY_TOP_K: usize = 5;

/// Columns without which no section can be computed
const REQUIRED_FIELDS: [Field; 2] = [Field::Date, Field::Amount];

/// Knobs for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub title: String,
    /// Items kept in the product ranking
    pub top_n: usize,
    /// Items quoted in the summary
    pub top_k: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            top_n: DEFAULT_TOP_N,
            top_k: DEFAULT_SUMMARY_TOP_K,
        }
    }
}

/// Run every analysis over a parsed file
pub fn analyze(table: &ParsedTable, options: &AnalysisOptions) -> Result<AnalysisResult, AnalysisError> {
    if table.records.is_empty() {
        return Err(AnalysisError::NoRecords);
    }
    if let Some(field) = REQUIRED_FIELDS.into_iter().find(|f| !table.has_field(*f)) {
        return Err(AnalysisError::MissingColumn(field));
    }

    let records = &table.records;

    let trend = analyze_consumption_trend(records);
    if trend.total.is_empty() {
        return Err(AnalysisError::NoDatedRecords);
    }
    tracing::debug!("Trend analysis complete");

    let buyers = calculate_daily_buyers(records);
    let channels = analyze_channels(records);
    tracing::debug!("Channel analysis complete");

    let categories = analyze_product_categories(records);
    let ranking = rank_products(records, options.top_n);
    let item_tiers = item_tier_breakdown(records);
    tracing::debug!("Product analysis complete");

    let arpu = analyze_arpu(records);

    let stats = summary_stats(records, &trend, &buyers, options.top_k);
    let recommendations = generate_recommendations(&recommendation_input(&stats, &trend, &buyers, &categories));

    tracing::info!(
        "Analysis complete: {} records, {} days, {} recommendations",
        records.len(),
        stats.days,
        recommendations.recommendations.len()
    );

    Ok(AnalysisResult {
        trend,
        buyers,
        channels,
        categories,
        ranking,
        item_tiers,
        arpu,
        stats,
        recommendations,
    })
}

/// Narrative scalars shared by the section fragments and the summary.
///
/// Every figure is taken over dated records only, the same rows the trend
/// total covers, so the top-item share stays within `[0, 1]`.
pub fn summary_stats(records: &[Record], trend: &ConsumptionTrend, buyers: &BuyersTrend, top_k: usize) -> SummaryStats {
    let total_consumption = trend.total.total();

    let mut top_tier: Option<(PaymentTier, f64)> = None;
    for tier_trend in &trend.tiers {
        let mean = tier_trend.trend.mean;
        // strict comparison keeps the earlier tier on ties
        if mean > 0.0 && top_tier.map_or(true, |(_, best)| mean > best) {
            top_tier = Some((tier_trend.tier, mean));
        }
    }

    let dated = group_by_date(records);
    let top_items = rank_products(dated.values().flatten().copied(), top_k).products;
    let top_value: f64 = top_items.iter().map(|p| p.value).sum();
    // refund rows can push the dated total below the positive item totals
    let top_items_share = if total_consumption > 0.0 {
        (top_value / total_consumption).min(1.0)
    } else {
        0.0
    };

    SummaryStats {
        total_consumption,
        days: trend.total.dates.len(),
        direction: TrendDirection::from_values(&trend.total.values),
        growth_rate: growth_rate(&trend.total.values),
        top_tier: top_tier.map(|(tier, _)| tier),
        top_tier_mean: top_tier.map(|(_, mean)| mean).unwrap_or(0.0),
        top_items,
        top_items_share,
        total_buyers: buyers.total_buyers.iter().sum(),
    }
}

fn recommendation_input(
    stats: &SummaryStats,
    trend: &ConsumptionTrend,
    buyers: &BuyersTrend,
    categories: &ProductConsumptionAnalysis,
) -> RecommendationInput {
    let share = |part: f64, whole: f64| if whole > 0.0 { part / whole } else { 0.0 };

    let whale_total = trend.tier(PaymentTier::Whale).map(|t| t.total()).unwrap_or(0.0);
    let free_buyers: f64 = buyers.tier(PaymentTier::FreeUser).map(|v| v.iter().sum()).unwrap_or(0.0);

    RecommendationInput {
        days: stats.days,
        total_consumption: stats.total_consumption,
        direction: stats.direction,
        growth_rate: stats.growth_rate,
        whale_share: share(whale_total, stats.total_consumption),
        cosmetic_share: categories.proportion.appearance,
        top_item_share: stats.top_items_share,
        top_item_count: stats.top_items.len(),
        coefficient_of_variation: coefficient_of_variation(&trend.total.values),
        free_user_buyer_share: share(free_buyers, stats.total_buyers),
        total_buyers: stats.total_buyers,
    }
}

/// Lay out an analysis result as report sections
pub fn build_report(result: &AnalysisResult, options: &AnalysisOptions) -> AnalysisReport {
    let trend_chart = charts::consumption_trend_chart("Tianyu Consumption Trend", &result.trend.total, PRIMARY_COLOR);
    let tier_charts = result
        .trend
        .tiers
        .iter()
        .map(|t| charts::tier_trend_chart(t.tier, &t.trend))
        .collect();

    let trends = vec![
        ReportSection::new(
            "consumption-trend",
            "Tianyu Consumption Trend",
            SectionData::ConsumptionTrend {
                chart: trend_chart,
                tier_charts,
                trend: result.trend.clone(),
                narrative: fragments::consumption_trend(&result.trend, &result.stats),
            },
        ),
        ReportSection::new(
            "buyers-trend",
            "Daily Purchasers",
            SectionData::BuyersTrend {
                chart: charts::buyers_trend_chart("Daily Purchasers by Tier", &result.buyers),
                buyers: result.buyers.clone(),
                narrative: fragments::buyers_trend(&result.buyers),
            },
        ),
    ];

    let users = vec![ReportSection::new(
        "channel-breakdown",
        "Consumption by Tier and Channel",
        SectionData::ChannelBreakdown {
            chart: charts::channel_chart("Tier Consumption by Channel", &result.channels),
            average_chart: charts::tier_average_chart("Average Consumption per Purchaser", &result.channels),
            analysis: result.channels.clone(),
            narrative: fragments::channel_breakdown(&result.channels),
        },
    )];

    let products = vec![
        ReportSection::new(
            "product-ranking",
            "Top Items",
            SectionData::ProductRanking {
                chart: charts::ranking_chart("Top Items by Consumption", &result.ranking),
                ranking: result.ranking.clone(),
                item_tiers: result.item_tiers.clone(),
                narrative: fragments::product_ranking(&result.ranking, &result.item_tiers),
            },
        ),
        ReportSection::new(
            "category-split",
            "Appearance vs Value",
            SectionData::CategorySplit {
                pie_chart: charts::category_pie_chart("Consumption by Category", &result.categories),
                trend_chart: charts::category_trend_chart("Daily Consumption by Category", &result.categories),
                analysis: result.categories.clone(),
                narrative: fragments::category_split(&result.categories),
            },
        ),
    ];

    let skills = vec![ReportSection::new(
        "arpu",
        "Revenue per Active User",
        SectionData::Arpu {
            chart: charts::arpu_chart("ARPU by Tier", &result.arpu),
            analysis: result.arpu.clone(),
            narrative: fragments::arpu(&result.arpu),
        },
    )];

    AnalysisReport {
        title: options.title.clone(),
        trends,
        users,
        products,
        skills,
        summary: SummarySection {
            id: "summary".to_string(),
            title: "Summary and Recommendations".to_string(),
            content: fragments::fallback_summary(&result.stats, &result.recommendations),
            stats: result.stats.clone(),
            recommendations: result.recommendations.clone(),
        },
    }
}

/// Structurally valid report with empty sections and the error message
pub fn degenerate_report(title: &str) -> AnalysisReport {
    AnalysisReport {
        title: if title.is_empty() { DEFAULT_TITLE } else { title }.to_string(),
        trends: Vec::new(),
        users: Vec::new(),
        products: Vec::new(),
        skills: Vec::new(),
        summary: SummarySection {
            id: "summary".to_string(),
            title: "Summary and Recommendations".to_string(),
            content: fragments::error_message(),
            stats: SummaryStats::default(),
            recommendations: RecommendationSummary::default(),
        },
    }
}

/// Analyze and lay out a file, falling back to the degenerate report on failure.
///
/// The analysis result is returned alongside the report when it succeeded.
pub fn assemble_or_degenerate(
    table: &ParsedTable,
    options: &AnalysisOptions,
) -> (AnalysisReport, Option<AnalysisResult>) {
    match analyze(table, options) {
        Ok(result) => (build_report(&result, options), Some(result)),
        Err(e) => {
            tracing::warn!("Analysis failed, returning degenerate report: {}", e);
            (degenerate_report(&options.title), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;
    use crate::recommendations::RecommendationType;
    use crate::report::ERROR_MESSAGE;

    const SCENARIO: &str = "日期,付费区间,消耗途径,物品名称,天玉消耗额,角色数\n\
        2025-04-17,土豪,Unlock Appearance,Skin A,1000,1\n\
        2025-04-17,平民,Mall Purchase,Potion,200,2\n\
        2025-04-18,土豪,Mall Purchase,Potion,300,1\n";

    fn scenario() -> ParsedTable {
        parse_table(SCENARIO).unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let result = analyze(&scenario(), &AnalysisOptions::default()).unwrap();

        let dates: Vec<&str> = result.trend.total.dates.iter().map(|d| d.as_str()).collect();
        assert_eq!(dates, vec!["2025-04-17", "2025-04-18"]);
        assert_eq!(result.trend.total.values, vec![1200.0, 300.0]);
        assert_eq!(result.stats.direction, TrendDirection::Decreasing);

        let whale = result.channels.tier(PaymentTier::Whale).unwrap();
        assert_eq!(whale.total_consumption, 1300.0);
        assert_eq!(whale.avg_consumption, 650.0);

        assert_eq!(result.ranking.products[0].name, "Skin A");
        assert_eq!(result.ranking.products[0].value, 1000.0);
        assert_eq!(result.ranking.products[1].name, "Potion");
        assert_eq!(result.ranking.products[1].value, 500.0);

        let days = &result.categories.daily_data;
        assert_eq!((days[0].appearance, days[0].value), (1000.0, 200.0));
        assert_eq!((days[1].appearance, days[1].value), (0.0, 300.0));
    }

    #[test]
    fn test_summary_stats() {
        let result = analyze(&scenario(), &AnalysisOptions::default()).unwrap();
        let stats = &result.stats;

        assert_eq!(stats.total_consumption, 1500.0);
        assert_eq!(stats.days, 2);
        assert!((stats.growth_rate + 75.0).abs() < 1e-9);
        assert_eq!(stats.top_tier, Some(PaymentTier::Whale));
        assert_eq!(stats.top_tier_mean, 650.0);
        assert_eq!(stats.total_buyers, 4.0);
        assert!((stats.top_items_share - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_k_share_against_total() {
        let options = AnalysisOptions {
            top_k: 1,
            ..Default::default()
        };
        let result = analyze(&scenario(), &options).unwrap();
        assert_eq!(result.stats.top_items.len(), 1);
        assert!((result.stats.top_items_share - 1000.0 / 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_item_share_ignores_undated_rows() {
        let table = parse_table("日期,物品名称,天玉消耗额\n2025-04-17,A,100\nsoon,B,900\n").unwrap();
        let result = analyze(&table, &AnalysisOptions::default()).unwrap();
        let stats = &result.stats;

        assert_eq!(stats.total_consumption, 100.0);
        let names: Vec<&str> = stats.top_items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
        assert!((stats.top_items_share - 1.0).abs() < 1e-9);

        let concentration = result
            .recommendations
            .recommendations
            .iter()
            .find(|r| r.rec_type == RecommendationType::ItemConcentration)
            .unwrap();
        assert!(concentration.description.contains("100.0%"));
        assert!(concentration.severity <= 1.0);
    }

    #[test]
    fn test_report_layout() {
        let (report, result) = assemble_or_degenerate(&scenario(), &AnalysisOptions::default());
        assert!(result.is_some());
        assert_eq!(report.title, DEFAULT_TITLE);
        assert_eq!(report.trends.len(), 2);
        assert_eq!(report.users.len(), 1);
        assert_eq!(report.products.len(), 2);
        assert_eq!(report.skills.len(), 1);

        let trend = report.section("consumption-trend").unwrap();
        match &trend.data {
            SectionData::ConsumptionTrend { tier_charts, narrative, .. } => {
                assert_eq!(tier_charts.len(), 5);
                assert!(narrative.contains("decreasing"));
            }
            other => panic!("unexpected section data: {:?}", other),
        }
        assert!(report.summary.content.contains("## Recommendations"));
    }

    #[test]
    fn test_missing_amount_column_degenerates() {
        let table = parse_table("日期,付费区间\n2025-04-17,土豪\n").unwrap();
        assert_eq!(
            analyze(&table, &AnalysisOptions::default()).unwrap_err(),
            AnalysisError::MissingColumn(Field::Amount)
        );

        let (report, result) = assemble_or_degenerate(&table, &AnalysisOptions::default());
        assert!(result.is_none());
        assert!(report.trends.is_empty());
        assert!(report.skills.is_empty());
        assert!(report.summary.content.contains(ERROR_MESSAGE));
    }

    #[test]
    fn test_header_only_and_undated_files() {
        let header_only = parse_table("日期,天玉消耗额\n").unwrap();
        assert_eq!(
            analyze(&header_only, &AnalysisOptions::default()).unwrap_err(),
            AnalysisError::NoRecords
        );

        let undated = parse_table("日期,天玉消耗额\nsoon,10\n").unwrap();
        assert_eq!(
            analyze(&undated, &AnalysisOptions::default()).unwrap_err(),
            AnalysisError::NoDatedRecords
        );
    }

    #[test]
    fn test_degenerate_report_serializes() {
        let report = degenerate_report("");
        assert_eq!(report.title, DEFAULT_TITLE);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"trends\":[]"));
        assert!(json.contains("\"summary\""));
    }
}
