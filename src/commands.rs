//! Command handlers
//!
//! Entry points used by the CLI: load an export, run the pipeline against an
//! [`AnalysisSession`], attach the narrative summary and write exports.
//! Progress is reported as integer percents that never decrease and always
//! end at 100, whether the run succeeds or fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::export::{
    csv_export, generate_export_filename, json_export, ExportFormat, ExportableProduct,
    ExportableTrendRow,
};
use crate::narrative::{narrative_or_fallback, NarrativeClient, NarrativeTask};
use crate::parser::{check_extension, parse_chunked, read_input};
use crate::report::{assemble_or_degenerate, AnalysisReport, AnalysisResult};
use crate::session::{AnalysisSession, UploadId};
use crate::CommandError;

/// Progress milestones after parsing
mod milestones {
    /// Share of the bar covered by the parser
    pub const PARSE_END: u8 = 60;
    pub const STORED: u8 = 65;
    pub const ANALYZED: u8 = 90;
    pub const DONE: u8 = 100;
}

/// Forwards progress to a callback, never going backwards
pub struct ProgressReporter<F: FnMut(u8)> {
    callback: F,
    last: Option<u8>,
}

impl<F: FnMut(u8)> ProgressReporter<F> {
    pub fn new(callback: F) -> Self {
        Self { callback, last: None }
    }

    /// Report `percent`, clamped to `[last, 100]`. Repeats are dropped.
    pub fn report(&mut self, percent: u8) {
        let percent = percent.min(milestones::DONE);
        match self.last {
            Some(last) if percent <= last => {}
            _ => {
                self.last = Some(percent);
                (self.callback)(percent);
            }
        }
    }

    /// Map parser progress onto the parsing share of the bar
    pub fn report_parse(&mut self, parsed: u8) {
        let scaled = u16::from(parsed.min(100)) * u16::from(milestones::PARSE_END) / 100;
        self.report(scaled as u8);
    }

    pub fn finish(&mut self) {
        self.report(milestones::DONE);
    }

    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

/// What one pipeline run produced
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    /// Present unless the report is the degenerate fallback
    pub result: Option<Arc<AnalysisResult>>,
}

impl AnalysisOutcome {
    pub fn is_degenerate(&self) -> bool {
        self.result.is_none()
    }
}

/// Parse and analyze an export already held in memory.
///
/// Parser failures are returned and leave the session empty. Analysis
/// failures produce the degenerate report and also clear the session.
pub async fn analyze_text<F>(
    text: &str,
    config: &AppConfig,
    session: &AnalysisSession,
    on_progress: F,
) -> Result<AnalysisOutcome, CommandError>
where
    F: FnMut(u8),
{
    let upload = session.begin_upload();
    analyze_upload_text(text, config, session, upload, on_progress).await
}

async fn analyze_upload_text<F>(
    text: &str,
    config: &AppConfig,
    session: &AnalysisSession,
    upload: UploadId,
    on_progress: F,
) -> Result<AnalysisOutcome, CommandError>
where
    F: FnMut(u8),
{
    let mut progress = ProgressReporter::new(on_progress);

    let parsed = parse_chunked(text, config.batch_size, |p| progress.report_parse(p)).await;
    let table = match parsed {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Failed to parse input: {}", e);
            session.clear();
            progress.finish();
            return Err(e.into());
        }
    };
    tracing::info!(
        "Parsed {} records with {} columns",
        table.records.len(),
        table.headers.len()
    );

    let table = session.store_table(upload, table);
    progress.report(milestones::STORED);

    let (report, result) = assemble_or_degenerate(&table, &config.analysis_options());
    progress.report(milestones::ANALYZED);

    let result = match result {
        Some(result) => Some(session.publish(upload, result)),
        None => {
            session.clear();
            None
        }
    };

    progress.finish();
    tracing::info!(
        "Analysis finished with {} sections",
        report.sections().count()
    );

    Ok(AnalysisOutcome { report, result })
}

/// Check, read and analyze an export file
pub async fn analyze_file<F>(
    path: &Path,
    config: &AppConfig,
    session: &AnalysisSession,
    on_progress: F,
) -> Result<AnalysisOutcome, CommandError>
where
    F: FnMut(u8),
{
    let upload = session.begin_upload();
    analyze_upload_file(path, config, session, upload, on_progress).await
}

async fn analyze_upload_file<F>(
    path: &Path,
    config: &AppConfig,
    session: &AnalysisSession,
    upload: UploadId,
    mut on_progress: F,
) -> Result<AnalysisOutcome, CommandError>
where
    F: FnMut(u8),
{
    let text = match check_extension(path) {
        Ok(()) => read_input(path).await,
        Err(e) => Err(e),
    };

    match text {
        Ok(text) => analyze_upload_text(&text, config, session, upload, on_progress).await,
        Err(e) => {
            tracing::error!("Rejected input {:?}: {}", path, e);
            session.clear();
            on_progress(milestones::DONE);
            Err(e.into())
        }
    }
}

/// Analyze a file and, when enabled, replace the summary with a generated narrative.
///
/// The upload is registered before the narrative request is spawned, so the
/// request only ever sees this file's result. It is aborted if the run fails
/// before a result is published.
pub async fn generate_report<F>(
    path: &Path,
    config: &AppConfig,
    session: Arc<AnalysisSession>,
    on_progress: F,
) -> Result<AnalysisOutcome, CommandError>
where
    F: FnMut(u8),
{
    let upload = session.begin_upload();
    let narrative = if config.narrative.enabled {
        let client = NarrativeClient::new(config.narrative.clone())?;
        Some(NarrativeTask::spawn(client, session.clone(), upload))
    } else {
        None
    };

    let mut outcome = analyze_upload_file(path, config, &session, upload, on_progress).await?;

    match (narrative, outcome.result.as_ref()) {
        (Some(task), Some(result)) => {
            let text = narrative_or_fallback(task, result).await;
            outcome.report.set_summary_content(text);
        }
        (Some(task), None) => task.abort(),
        _ => {}
    }

    Ok(outcome)
}

/// Write the outcome into `directory` and return the files created.
///
/// JSON writes the whole report. CSV writes the daily trend table and the
/// item ranking, and needs a successful analysis.
pub fn export_report(
    outcome: &AnalysisOutcome,
    format: ExportFormat,
    directory: &Path,
) -> Result<Vec<PathBuf>, CommandError> {
    std::fs::create_dir_all(directory)?;

    match format {
        ExportFormat::Json => {
            let path = directory.join(generate_export_filename("tianyu_report", format.extension()));
            json_export::write_report_json(&outcome.report, outcome.result.as_deref(), &path)?;
            Ok(vec![path])
        }
        ExportFormat::Csv => {
            let result = outcome.result.as_ref().ok_or_else(|| {
                CommandError::Export("No analysis result available for CSV export".to_string())
            })?;

            let trend_path = directory.join(generate_export_filename("tianyu_trend", format.extension()));
            csv_export::write_trend_csv(&ExportableTrendRow::from_trend(&result.trend), &trend_path)?;

            let ranking_path =
                directory.join(generate_export_filename("tianyu_ranking", format.extension()));
            csv_export::write_ranking_csv(&ExportableProduct::from_ranking(&result.ranking), &ranking_path)?;

            Ok(vec![trend_path, ranking_path])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseError;
    use crate::report::ERROR_MESSAGE;

    const SCENARIO: &str = "日期,付费区间,消耗途径,物品名称,天玉消耗额,角色数\n\
        2025-04-17,土豪,Unlock Appearance,Skin A,1000,1\n\
        2025-04-17,平民,Mall Purchase,Potion,200,2\n\
        2025-04-18,土豪,Mall Purchase,Potion,300,1\n";

    fn assert_monotonic_to_100(seen: &[u8]) {
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "not increasing: {:?}", seen);
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn test_progress_reporter_is_monotonic() {
        let mut seen = Vec::new();
        {
            let mut progress = ProgressReporter::new(|p| seen.push(p));
            progress.report(10);
            progress.report(5);
            progress.report(10);
            progress.report_parse(100);
            progress.report(250);
            progress.finish();
        }
        assert_eq!(seen, vec![10, 60, 100]);
    }

    #[tokio::test]
    async fn test_analyze_text_publishes_result() {
        let session = AnalysisSession::new();
        let mut seen = Vec::new();

        let outcome = analyze_text(SCENARIO, &AppConfig::default(), &session, |p| seen.push(p))
            .await
            .unwrap();

        assert!(!outcome.is_degenerate());
        assert_eq!(outcome.report.sections().count(), 6);
        assert!(session.is_ready());
        assert_eq!(session.table().unwrap().records.len(), 3);
        assert_monotonic_to_100(&seen);
    }

    #[tokio::test]
    async fn test_parse_failure_clears_session() {
        let session = AnalysisSession::new();
        analyze_text(SCENARIO, &AppConfig::default(), &session, |_| {})
            .await
            .unwrap();

        let mut seen = Vec::new();
        let err = analyze_text("", &AppConfig::default(), &session, |p| seen.push(p))
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::Parse(ParseError::EmptyHeader)));
        assert!(session.table().is_none());
        assert!(!session.is_ready());
        assert_eq!(seen, vec![100]);
    }

    #[tokio::test]
    async fn test_missing_column_gives_degenerate_report() {
        let session = AnalysisSession::new();
        let mut seen = Vec::new();

        let outcome = analyze_text("Foo,Bar\n1,2\n", &AppConfig::default(), &session, |p| seen.push(p))
            .await
            .unwrap();

        assert!(outcome.is_degenerate());
        assert_eq!(outcome.report.sections().count(), 0);
        assert!(outcome.report.summary.content.contains(ERROR_MESSAGE));
        assert!(session.table().is_none());
        assert_monotonic_to_100(&seen);
    }

    #[tokio::test]
    async fn test_analyze_file_rejects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        std::fs::write(&path, SCENARIO).unwrap();

        let mut seen = Vec::new();
        let err = analyze_file(&path, &AppConfig::default(), &AnalysisSession::new(), |p| seen.push(p))
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::Parse(ParseError::UnsupportedExtension(_))));
        assert_eq!(seen, vec![100]);
    }

    #[tokio::test]
    async fn test_generate_report_without_narrative() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consumption.csv");
        std::fs::write(&path, SCENARIO).unwrap();

        let session = Arc::new(AnalysisSession::new());
        let outcome = generate_report(&path, &AppConfig::default(), session.clone(), |_| {})
            .await
            .unwrap();

        assert!(outcome.report.summary.content.contains("## Overview"));
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_export_report_formats() {
        let session = AnalysisSession::new();
        let outcome = analyze_text(SCENARIO, &AppConfig::default(), &session, |_| {})
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let json = export_report(&outcome, ExportFormat::Json, dir.path()).unwrap();
        assert_eq!(json.len(), 1);
        assert!(json[0].exists());

        let csv = export_report(&outcome, ExportFormat::Csv, dir.path()).unwrap();
        assert_eq!(csv.len(), 2);
        let trend = std::fs::read_to_string(&csv[0]).unwrap();
        assert_eq!(trend.lines().count(), 3);
        let ranking = std::fs::read_to_string(&csv[1]).unwrap();
        assert!(ranking.lines().nth(1).unwrap().starts_with("1,Skin A,1000.0"));
    }

    #[tokio::test]
    async fn test_csv_export_needs_result() {
        let session = AnalysisSession::new();
        let outcome = analyze_text("Foo\n1\n", &AppConfig::default(), &session, |_| {})
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();

        assert!(export_report(&outcome, ExportFormat::Csv, dir.path()).is_err());
        assert!(export_report(&outcome, ExportFormat::Json, dir.path()).is_ok());
    }

    #[tokio::test]
    async fn test_reused_session_serves_current_upload() {
        let session = Arc::new(AnalysisSession::new());
        let config = AppConfig::default();

        let old = analyze_text("日期,天玉消耗额\n2025-04-17,999\n", &config, &session, |_| {})
            .await
            .unwrap();
        assert_eq!(old.result.unwrap().stats.total_consumption, 999.0);
        let stale_upload = session.current_upload();

        let upload = session.begin_upload();
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_ready(upload).await })
        };
        let stale_waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_ready(stale_upload).await })
        };

        analyze_upload_text("日期,天玉消耗额\n2025-04-18,5\n", &config, &session, upload, |_| {})
            .await
            .unwrap();

        let fresh = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(fresh.stats.total_consumption, 5.0);

        let stale = tokio::time::timeout(std::time::Duration::from_secs(1), stale_waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(stale.is_none());
        assert_eq!(session.result().unwrap().stats.total_consumption, 5.0);
    }
}
