//! Narrative module
//!
//! This module produces the summary text of a report:
//! - Streaming chat-completion client with SSE decoding
//! - Prompt construction from the aggregated results
//! - An abortable background task that waits for the analysis to finish
//! - The static fallback summary on any failure

pub mod client;
pub mod sse;

use std::sync::Arc;

use futures::future::{abortable, AbortHandle, Aborted};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::metrics::product::{CategoryTotals, RankedProduct};
use crate::report::{fragments, AnalysisResult, SummaryStats};
use crate::session::{AnalysisSession, UploadId};

pub use client::NarrativeClient;

/// Domain instructions sent ahead of every request
pub const SYSTEM_PROMPT: &str = "You are a senior game economy analyst. You receive \
aggregated Tianyu (premium currency) consumption data of an online game as JSON: totals, \
the daily trend, spending per payment tier (Whale, BigSpender, MidSpender, SmallSpender, \
FreeUser) and channel, the top items, the split between appearance and value purchases, \
revenue per active user, and rule-based findings. Write a concise summary in Markdown with \
an \"Overview\" section and a \"Recommendations\" section. Quote concrete numbers from \
the data and do not invent figures.";

/// Errors raised while generating a narrative
#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("Narrative generation is disabled")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Narrative service returned status {0}")]
    Status(u16),

    #[error("Narrative service returned no text")]
    EmptyResponse,

    #[error("Narrative request was aborted")]
    Aborted,

    #[error("Analysis session was cleared before a result was published")]
    SessionCleared,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct TierDigest {
    tier: &'static str,
    total_consumption: f64,
    avg_consumption: f64,
    user_count: f64,
    channels: Vec<(String, f64)>,
}

#[derive(Serialize)]
struct PromptDigest<'a> {
    summary: &'a SummaryStats,
    daily_consumption: Vec<(&'a str, f64)>,
    tiers: Vec<TierDigest>,
    top_items: &'a [RankedProduct],
    categories: &'a CategoryTotals,
    overall_arpu: f64,
    findings: Vec<&'a str>,
}

/// User message embedding the aggregates as JSON
pub fn build_user_prompt(result: &AnalysisResult) -> Result<String, NarrativeError> {
    let total = &result.trend.total;
    let digest = PromptDigest {
        summary: &result.stats,
        daily_consumption: total
            .dates
            .iter()
            .map(|d| d.as_str())
            .zip(total.values.iter().copied())
            .collect(),
        tiers: result
            .channels
            .consumption_data
            .iter()
            .map(|c| TierDigest {
                tier: c.user_group.display_name(),
                total_consumption: c.total_consumption,
                avg_consumption: c.avg_consumption,
                user_count: c.user_count,
                channels: c
                    .channel_data
                    .iter()
                    .map(|a| (a.channel.clone(), a.amount))
                    .collect(),
            })
            .collect(),
        top_items: &result.ranking.products,
        categories: &result.categories.total,
        overall_arpu: result.arpu.overall_arpu,
        findings: result
            .recommendations
            .recommendations
            .iter()
            .map(|r| r.description.as_str())
            .collect(),
    };

    Ok(format!(
        "Summarize this consumption analysis:\n{}",
        serde_json::to_string_pretty(&digest)?
    ))
}

/// Background narrative request.
///
/// The request starts once the session publishes a result. Dropping the
/// task aborts the request.
pub struct NarrativeTask {
    abort: AbortHandle,
    handle: Option<JoinHandle<Result<Result<String, NarrativeError>, Aborted>>>,
}

impl NarrativeTask {
    /// Spawn onto the current runtime. The request waits for the result of `upload`.
    pub fn spawn(client: NarrativeClient, session: Arc<AnalysisSession>, upload: UploadId) -> Self {
        let (future, abort) = abortable(async move {
            let result = session
                .wait_ready(upload)
                .await
                .ok_or(NarrativeError::SessionCleared)?;
            client.generate(&result).await
        });

        Self {
            abort,
            handle: Some(tokio::spawn(future)),
        }
    }

    pub fn abort(&self) {
        self.abort.abort();
    }

    /// Wait for the generated text
    pub async fn finish(mut self) -> Result<String, NarrativeError> {
        let handle = self.handle.take().ok_or(NarrativeError::Aborted)?;
        match handle.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(Aborted)) => Err(NarrativeError::Aborted),
            Err(e) => {
                tracing::error!("Narrative task failed: {}", e);
                Err(NarrativeError::Aborted)
            }
        }
    }
}

impl Drop for NarrativeTask {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Generated narrative, or the static summary when generation fails
pub async fn narrative_or_fallback(task: NarrativeTask, result: &AnalysisResult) -> String {
    match task.finish().await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Using fallback summary: {}", e);
            fragments::fallback_summary(&result.stats, &result.recommendations)
        }
    }
}
