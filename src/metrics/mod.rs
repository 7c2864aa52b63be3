//! Aggregation metrics
//!
//! Cross-sectional aggregates built on top of the grouping layer:
//! - Channel x payment tier breakdown with a top-channel cutoff
//! - Item ranking, cosmetic/power split and item-by-tier shares
//! - Revenue per daily active user

pub mod arpu;
pub mod channel;
pub mod product;

pub use arpu::{analyze_arpu, ArpuAnalysis};
pub use channel::{analyze_channels, ChannelAnalysis, ChannelConsumptionData};
pub use product::{
    analyze_product_categories, item_tier_breakdown, rank_products, CosmeticPolicy, ProductCategory,
    ProductConsumptionAnalysis, ProductRankingData, DEFAULT_TOP_N,
};

/// Format a number for narrative text; values of at least 10,000 use 万 units
pub fn format_large_number(value: f64) -> String {
    if value >= 10_000.0 {
        return format!("{:.2}万", value / 10_000.0);
    }

    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 {
        group_thousands(rounded as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
