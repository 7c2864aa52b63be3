//! Export module for CSV and JSON export functionality
//!
//! Writes the assembled report as JSON, and the daily trend table and the
//! item ranking as CSV.

pub mod csv_export;
pub mod json_export;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::metrics::ProductRankingData;
use crate::models::PaymentTier;
use crate::trends::ConsumptionTrend;
use crate::CommandError;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(CommandError::Export(format!(
                "Invalid export format: {}. Use 'csv' or 'json'",
                s
            ))),
        }
    }
}

impl ExportFormat {
    /// Get file extension for format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One row of the daily trend table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportableTrendRow {
    pub date: String,
    pub total: f64,
    pub whale: f64,
    pub big_spender: f64,
    pub mid_spender: f64,
    pub small_spender: f64,
    pub free_user: f64,
    /// Fitted trend value at this date
    pub trend_value: f64,
}

impl ExportableTrendRow {
    /// One row per date of the overall series
    pub fn from_trend(trend: &ConsumptionTrend) -> Vec<Self> {
        let total = &trend.total;
        let tier_value = |tier: PaymentTier, i: usize| {
            trend
                .tier(tier)
                .and_then(|t| t.values.get(i).copied())
                .unwrap_or(0.0)
        };

        total
            .dates
            .iter()
            .enumerate()
            .map(|(i, date)| Self {
                date: date.as_str().to_string(),
                total: total.values.get(i).copied().unwrap_or(0.0),
                whale: tier_value(PaymentTier::Whale, i),
                big_spender: tier_value(PaymentTier::BigSpender, i),
                mid_spender: tier_value(PaymentTier::MidSpender, i),
                small_spender: tier_value(PaymentTier::SmallSpender, i),
                free_user: tier_value(PaymentTier::FreeUser, i),
                trend_value: total.trend_values.get(i).copied().unwrap_or(0.0),
            })
            .collect()
    }
}

/// One row of the item ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportableProduct {
    pub rank: usize,
    pub name: String,
    pub consumption: f64,
    /// Share of the ranked total
    pub share: f64,
}

impl ExportableProduct {
    pub fn from_ranking(ranking: &ProductRankingData) -> Vec<Self> {
        ranking
            .products
            .iter()
            .enumerate()
            .map(|(i, product)| Self {
                rank: i + 1,
                name: product.name.clone(),
                consumption: product.value,
                share: if ranking.total_consumption > 0.0 {
                    product.value / ranking.total_consumption
                } else {
                    0.0
                },
            })
            .collect()
    }
}

/// Get the default export directory (Downloads folder or temp dir)
pub fn get_export_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::document_dir)
        .unwrap_or_else(std::env::temp_dir)
}

/// Generate a timestamped filename for exports
pub fn generate_export_filename(prefix: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.{}", prefix, timestamp, extension)
}

pub use csv_export::*;
pub use json_export::*;
