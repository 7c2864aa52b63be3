//! Chart configuration builders
//!
//! Declarative chart descriptions handed to the presentation layer. They carry
//! data and styling intent only; rendering happens elsewhere.

use serde::{Deserialize, Serialize};

use crate::metrics::channel::ChannelAnalysis;
use crate::metrics::product::{ProductConsumptionAnalysis, ProductRankingData};
use crate::metrics::ArpuAnalysis;
use crate::models::{DateKey, PaymentTier};
use crate::trends::{BuyersTrend, TrendSummary};

/// Default series colour
pub const PRIMARY_COLOR: &str = "#3B82F6";
/// Dashed trend line colour
pub const TREND_LINE_COLOR: &str = "#A855F7";
/// Mean mark line colour
pub const MEAN_COLOR: &str = "#F97316";
pub const MAX_COLOR: &str = "#F43F5E";
pub const MIN_COLOR: &str = "#10B981";
pub const APPEARANCE_COLOR: &str = "#EC4899";
pub const VALUE_COLOR: &str = "#06B6D4";

/// Stack name shared by stacked bar series
const STACK_TOTAL: &str = "total";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// Horizontal reference line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkLine {
    pub label: String,
    pub value: f64,
    pub color: String,
    pub style: LineStyle,
}

/// Highlighted single point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkPoint {
    pub label: String,
    /// Category axis label the point sits on
    pub x: String,
    pub value: f64,
    pub color: String,
}

/// One data series of a line or bar chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub kind: ChartKind,
    pub data: Vec<f64>,
    pub color: String,
    pub style: LineStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub mark_lines: Vec<MarkLine>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub mark_points: Vec<MarkPoint>,
}

impl Series {
    fn new(name: impl Into<String>, kind: ChartKind, data: Vec<f64>, color: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
            color: color.to_string(),
            style: LineStyle::Solid,
            stack: None,
            mark_lines: Vec::new(),
            mark_points: Vec::new(),
        }
    }

    fn stacked(mut self) -> Self {
        self.stack = Some(STACK_TOTAL.to_string());
        self
    }
}

/// Slice of a pie chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

/// A complete chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub title: String,
    /// Category axis labels (empty for pie charts)
    pub x_axis: Vec<String>,
    pub y_axis_name: Option<String>,
    pub series: Vec<Series>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub slices: Vec<PieSlice>,
}

impl ChartConfig {
    fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            x_axis: Vec::new(),
            y_axis_name: None,
            series: Vec::new(),
            slices: Vec::new(),
        }
    }

    /// Legend entries in series (or slice) order
    pub fn legend(&self) -> Vec<&str> {
        if self.kind == ChartKind::Pie {
            self.slices.iter().map(|s| s.name.as_str()).collect()
        } else {
            self.series.iter().map(|s| s.name.as_str()).collect()
        }
    }
}

fn date_labels(dates: &[DateKey]) -> Vec<String> {
    dates.iter().map(DateKey::short_label).collect()
}

/// Consumption line with dashed trend line, mean line and max/min markers
pub fn consumption_trend_chart(title: &str, trend: &TrendSummary, color: &str) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Line, title);
    chart.x_axis = date_labels(&trend.dates);
    chart.y_axis_name = Some("Tianyu".to_string());

    let mut values = Series::new("Tianyu Consumption", ChartKind::Line, trend.values.clone(), color);
    if !trend.is_empty() {
        values.mark_lines.push(MarkLine {
            label: "Mean".to_string(),
            value: trend.mean,
            color: MEAN_COLOR.to_string(),
            style: LineStyle::Dashed,
        });
    }
    if let Some(max) = &trend.max {
        values.mark_points.push(MarkPoint {
            label: "Max".to_string(),
            x: max.date.short_label(),
            value: max.value,
            color: MAX_COLOR.to_string(),
        });
    }
    if let Some(min) = &trend.min {
        values.mark_points.push(MarkPoint {
            label: "Min".to_string(),
            x: min.date.short_label(),
            value: min.value,
            color: MIN_COLOR.to_string(),
        });
    }

    let mut trend_line = Series::new("Trend", ChartKind::Line, trend.trend_values.clone(), TREND_LINE_COLOR);
    trend_line.style = LineStyle::Dashed;

    chart.series = vec![values, trend_line];
    chart
}

/// Consumption chart for one payment tier, in the tier's colour
pub fn tier_trend_chart(tier: PaymentTier, trend: &TrendSummary) -> ChartConfig {
    let title = format!("{} Tianyu Consumption Trend", tier.display_name());
    consumption_trend_chart(&title, trend, tier.color())
}

/// Purchasers per day stacked by tier, FreeUser at the bottom
pub fn buyers_trend_chart(title: &str, buyers: &BuyersTrend) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Bar, title);
    chart.x_axis = date_labels(&buyers.dates);
    chart.y_axis_name = Some("Purchasers".to_string());

    chart.series = PaymentTier::ALL
        .into_iter()
        .rev()
        .map(|tier| {
            let values = buyers.tier(tier).map(<[f64]>::to_vec).unwrap_or_default();
            Series::new(tier.display_name(), ChartKind::Bar, values, tier.color()).stacked()
        })
        .collect();
    chart
}

/// Stacked consumption per tier over the main channels
pub fn channel_chart(title: &str, analysis: &ChannelAnalysis) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Bar, title);
    chart.x_axis = analysis.main_channels.clone();
    chart.y_axis_name = Some("Tianyu".to_string());

    chart.series = analysis
        .consumption_data
        .iter()
        .map(|data| {
            let values = data.channel_data.iter().map(|c| c.amount).collect();
            Series::new(data.user_group.display_name(), ChartKind::Bar, values, data.user_group.color()).stacked()
        })
        .collect();
    chart
}

/// Average consumption per user for each tier
pub fn tier_average_chart(title: &str, analysis: &ChannelAnalysis) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Bar, title);
    chart.x_axis = analysis
        .consumption_data
        .iter()
        .map(|d| d.user_group.display_name().to_string())
        .collect();
    chart.y_axis_name = Some("Tianyu per user".to_string());
    chart.series = vec![Series::new(
        "Average Consumption",
        ChartKind::Bar,
        analysis.consumption_data.iter().map(|d| d.avg_consumption).collect(),
        PRIMARY_COLOR,
    )];
    chart
}

/// Horizontal ranking of the top items
pub fn ranking_chart(title: &str, ranking: &ProductRankingData) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Bar, title);
    chart.x_axis = ranking.products.iter().map(|p| p.name.clone()).collect();
    chart.y_axis_name = Some("Tianyu".to_string());
    chart.series = vec![Series::new(
        "Consumption",
        ChartKind::Bar,
        ranking.products.iter().map(|p| p.value).collect(),
        PRIMARY_COLOR,
    )];
    chart
}

/// Appearance vs value split as a pie
pub fn category_pie_chart(title: &str, analysis: &ProductConsumptionAnalysis) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Pie, title);
    chart.slices = vec![
        PieSlice {
            name: "Appearance".to_string(),
            value: analysis.total.appearance,
            color: APPEARANCE_COLOR.to_string(),
        },
        PieSlice {
            name: "Value".to_string(),
            value: analysis.total.value,
            color: VALUE_COLOR.to_string(),
        },
    ];
    chart
}

/// Daily appearance vs value consumption, stacked
pub fn category_trend_chart(title: &str, analysis: &ProductConsumptionAnalysis) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Bar, title);
    chart.x_axis = date_labels(&analysis.dates);
    chart.y_axis_name = Some("Tianyu".to_string());
    chart.series = vec![
        Series::new(
            "Appearance",
            ChartKind::Bar,
            analysis.daily_data.iter().map(|d| d.appearance).collect(),
            APPEARANCE_COLOR,
        )
        .stacked(),
        Series::new(
            "Value",
            ChartKind::Bar,
            analysis.daily_data.iter().map(|d| d.value).collect(),
            VALUE_COLOR,
        )
        .stacked(),
    ];
    chart
}

/// ARPU per tier
pub fn arpu_chart(title: &str, analysis: &ArpuAnalysis) -> ChartConfig {
    let mut chart = ChartConfig::new(ChartKind::Bar, title);
    chart.x_axis = analysis
        .tiers
        .iter()
        .map(|t| t.tier.display_name().to_string())
        .collect();
    chart.y_axis_name = Some("Tianyu per DAU".to_string());
    chart.series = vec![Series::new(
        "ARPU",
        ChartKind::Bar,
        analysis.tiers.iter().map(|t| t.arpu).collect(),
        PRIMARY_COLOR,
    )];
    chart
}
