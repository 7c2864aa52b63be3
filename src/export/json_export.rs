//! JSON export functionality
//!
//! Serializes the assembled report, optionally with the raw aggregates,
//! with full structure preservation.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::report::{AnalysisReport, AnalysisResult};
use crate::CommandError;

const EXPORT_VERSION: &str = "1.0.0";

/// Complete export structure for JSON
#[derive(Debug, Clone, Serialize)]
pub struct ReportExportJson<'a> {
    pub export_date: String,
    pub export_version: &'static str,
    pub report: &'a AnalysisReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a AnalysisResult>,
}

/// Write the report to JSON format
pub fn write_report_json(
    report: &AnalysisReport,
    result: Option<&AnalysisResult>,
    path: &Path,
) -> Result<(), CommandError> {
    let export = ReportExportJson {
        export_date: chrono::Utc::now().to_rfc3339(),
        export_version: EXPORT_VERSION,
        report,
        result,
    };

    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| CommandError::Export(format!("Failed to serialize JSON: {}", e)))?;

    let mut file = std::fs::File::create(path)
        .map_err(|e| CommandError::Export(format!("Failed to create JSON file: {}", e)))?;

    file.write_all(json.as_bytes())
        .map_err(|e| CommandError::Export(format!("Failed to write JSON file: {}", e)))?;

    tracing::info!("Exported report to {:?}", path);
    Ok(())
}
