//! Report module
//!
//! This module turns analysis results into the dashboard report:
//! - Typed section payloads with chart configurations
//! - Narrative HTML fragments for every section
//! - The assembler, including the degenerate fallback report

pub mod assembler;
pub mod charts;
pub mod fragments;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::product::{ItemTierBreakdown, RankedProduct};
use crate::metrics::{ArpuAnalysis, ChannelAnalysis, ProductConsumptionAnalysis, ProductRankingData};
use crate::models::{Field, PaymentTier};
use crate::recommendations::RecommendationSummary;
use crate::trends::{BuyersTrend, ConsumptionTrend, TrendDirection};

pub use assembler::{analyze, assemble_or_degenerate, build_report, degenerate_report, AnalysisOptions};
pub use charts::ChartConfig;

/// Default report title
pub const DEFAULT_TITLE: &str = "Tianyu Consumption Analysis Report";

/// Narrative shown when the pipeline fails
pub const ERROR_MESSAGE: &str = "An error occurred during processing, please retry.";

/// Reasons the analysis cannot produce a meaningful report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("The file contains no data rows")]
    NoRecords,

    #[error("Required column missing: {}", .0.display_name())]
    MissingColumn(Field),

    #[error("No row carries a usable date")]
    NoDatedRecords,
}

/// Scalars quoted across the narrative sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_consumption: f64,
    /// Number of distinct dates
    pub days: usize,
    pub direction: TrendDirection,
    /// First-to-last change in percent
    pub growth_rate: f64,
    /// Tier with the highest mean daily consumption
    pub top_tier: Option<PaymentTier>,
    pub top_tier_mean: f64,
    /// Top-K items by consumption
    pub top_items: Vec<RankedProduct>,
    /// Combined share of `top_items` in total consumption (0.0 - 1.0)
    pub top_items_share: f64,
    pub total_buyers: f64,
}

/// Everything computed from one uploaded file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub trend: ConsumptionTrend,
    pub buyers: BuyersTrend,
    pub channels: ChannelAnalysis,
    pub categories: ProductConsumptionAnalysis,
    pub ranking: ProductRankingData,
    pub item_tiers: Vec<ItemTierBreakdown>,
    pub arpu: ArpuAnalysis,
    pub stats: SummaryStats,
    pub recommendations: RecommendationSummary,
}

/// Section-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionData {
    ConsumptionTrend {
        chart: ChartConfig,
        tier_charts: Vec<ChartConfig>,
        trend: ConsumptionTrend,
        narrative: String,
    },
    BuyersTrend {
        chart: ChartConfig,
        buyers: BuyersTrend,
        narrative: String,
    },
    ChannelBreakdown {
        chart: ChartConfig,
        average_chart: ChartConfig,
        analysis: ChannelAnalysis,
        narrative: String,
    },
    ProductRanking {
        chart: ChartConfig,
        ranking: ProductRankingData,
        item_tiers: Vec<ItemTierBreakdown>,
        narrative: String,
    },
    CategorySplit {
        pie_chart: ChartConfig,
        trend_chart: ChartConfig,
        analysis: ProductConsumptionAnalysis,
        narrative: String,
    },
    Arpu {
        chart: ChartConfig,
        analysis: ArpuAnalysis,
        narrative: String,
    },
    /// Placeholder used by the degenerate report
    Message { narrative: String },
}

impl SectionData {
    /// Narrative HTML fragment of the section
    pub fn narrative(&self) -> &str {
        match self {
            Self::ConsumptionTrend { narrative, .. }
            | Self::BuyersTrend { narrative, .. }
            | Self::ChannelBreakdown { narrative, .. }
            | Self::ProductRanking { narrative, .. }
            | Self::CategorySplit { narrative, .. }
            | Self::Arpu { narrative, .. }
            | Self::Message { narrative } => narrative,
        }
    }
}

/// One entry of a report section list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub id: String,
    pub title: String,
    pub data: SectionData,
}

impl ReportSection {
    pub fn new(id: &str, title: &str, data: SectionData) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            data,
        }
    }
}

/// Closing summary with recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySection {
    pub id: String,
    pub title: String,
    /// Narrative content (markdown or HTML)
    pub content: String,
    pub stats: SummaryStats,
    pub recommendations: RecommendationSummary,
}

/// The complete report handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub title: String,
    pub trends: Vec<ReportSection>,
    pub users: Vec<ReportSection>,
    pub products: Vec<ReportSection>,
    pub skills: Vec<ReportSection>,
    pub summary: SummarySection,
}

impl AnalysisReport {
    /// All sections in display order, summary excluded
    pub fn sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.trends
            .iter()
            .chain(&self.users)
            .chain(&self.products)
            .chain(&self.skills)
    }

    /// Look up a section by id
    pub fn section(&self, id: &str) -> Option<&ReportSection> {
        self.sections().find(|s| s.id == id)
    }

    /// Replace the summary narrative
    pub fn set_summary_content(&mut self, content: String) {
        self.summary.content = content;
    }
}
