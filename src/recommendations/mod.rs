//! Recommendations module
//!
//! Rule-based recommendations derived from the trend, tier, and product
//! figures of a report.

pub mod engine;
pub mod types;

// Re-export commonly used types
pub use engine::generate_recommendations;
pub use types::{Priority, Recommendation, RecommendationInput, RecommendationSummary, RecommendationType};
