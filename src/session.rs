//! Analysis session
//!
//! Owns the parsed file and the analysis result for the lifetime of one
//! upload. Every upload gets a fresh [`UploadId`]; consumers that need the
//! finished result (the narrative client) await
//! [`AnalysisSession::wait_ready`] for their upload instead of polling.

use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use crate::parser::ParsedTable;
use crate::report::AnalysisResult;

/// Identifies one upload within a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct UploadId(u64);

impl UploadId {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Default)]
struct ResultSlot {
    upload: UploadId,
    result: Option<Arc<AnalysisResult>>,
}

/// Per-upload cache of records and results
pub struct AnalysisSession {
    table: RwLock<Option<Arc<ParsedTable>>>,
    state: watch::Sender<ResultSlot>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    /// Create an empty session
    pub fn new() -> Self {
        let (state, _) = watch::channel(ResultSlot::default());
        Self {
            table: RwLock::new(None),
            state,
        }
    }

    /// Start a new upload, dropping everything cached for earlier ones.
    ///
    /// Waiters on earlier uploads resolve with `None`.
    pub fn begin_upload(&self) -> UploadId {
        if let Ok(mut slot) = self.table.write() {
            *slot = None;
        }

        let mut upload = UploadId::default();
        self.state.send_modify(|state| {
            state.upload = state.upload.next();
            state.result = None;
            upload = state.upload;
        });
        tracing::debug!("Upload {:?} started", upload);
        upload
    }

    /// The upload currently owning the cache
    pub fn current_upload(&self) -> UploadId {
        self.state.borrow().upload
    }

    /// Store the parsed file of `upload`. Ignored if a newer upload has started.
    pub fn store_table(&self, upload: UploadId, table: ParsedTable) -> Arc<ParsedTable> {
        let table = Arc::new(table);
        if self.current_upload() != upload {
            tracing::debug!("Ignoring table of superseded upload {:?}", upload);
            return table;
        }
        if let Ok(mut slot) = self.table.write() {
            *slot = Some(table.clone());
        }
        table
    }

    /// The parsed file of the current upload
    pub fn table(&self) -> Option<Arc<ParsedTable>> {
        self.table.read().ok()?.clone()
    }

    /// Publish the finished analysis of `upload` and wake its waiters.
    ///
    /// A result from a superseded upload never replaces the current state.
    pub fn publish(&self, upload: UploadId, result: AnalysisResult) -> Arc<AnalysisResult> {
        let result = Arc::new(result);
        let published = self.state.send_if_modified(|state| {
            if state.upload != upload {
                return false;
            }
            state.result = Some(result.clone());
            true
        });

        if published {
            tracing::debug!("Analysis result of upload {:?} published", upload);
        } else {
            tracing::debug!("Dropping result of superseded upload {:?}", upload);
        }
        result
    }

    /// The finished analysis of the current upload, if any
    pub fn result(&self) -> Option<Arc<AnalysisResult>> {
        self.state.borrow().result.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().result.is_some()
    }

    /// Drop everything held and wake pending waiters with `None`
    pub fn clear(&self) {
        self.begin_upload();
    }

    /// Resolve once the result of `upload` has been published.
    ///
    /// Returns `None` if the upload is superseded or cleared first.
    pub async fn wait_ready(&self, upload: UploadId) -> Option<Arc<AnalysisResult>> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| state.upload != upload || state.result.is_some())
            .await
            .ok()?;
        if state.upload == upload {
            state.result.clone()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::report::SummaryStats;

    fn table() -> ParsedTable {
        crate::parser::parse_table("日期,天玉消耗额\n2025-04-17,10\n").unwrap()
    }

    fn result_with_total(total: f64) -> AnalysisResult {
        AnalysisResult {
            stats: SummaryStats {
                total_consumption: total,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_store_and_clear() {
        let session = AnalysisSession::new();
        assert!(session.table().is_none());

        let upload = session.begin_upload();
        session.store_table(upload, table());
        assert_eq!(session.table().unwrap().records.len(), 1);

        session.publish(upload, AnalysisResult::default());
        assert!(session.is_ready());

        session.clear();
        assert!(session.table().is_none());
        assert!(session.result().is_none());
        assert!(!session.is_ready());
    }

    #[test]
    fn test_new_upload_discards_previous_result() {
        let session = AnalysisSession::new();
        let first = session.begin_upload();
        session.store_table(first, table());
        session.publish(first, AnalysisResult::default());

        let second = session.begin_upload();
        assert!(second > first);
        assert!(!session.is_ready());
        assert!(session.table().is_none());
    }

    #[test]
    fn test_superseded_upload_cannot_publish() {
        let session = AnalysisSession::new();
        let stale = session.begin_upload();
        let current = session.begin_upload();

        session.store_table(stale, table());
        session.publish(stale, result_with_total(999.0));
        assert!(session.table().is_none());
        assert!(!session.is_ready());

        session.publish(current, result_with_total(5.0));
        assert_eq!(session.result().unwrap().stats.total_consumption, 5.0);
    }

    #[tokio::test]
    async fn test_wait_ready_resolves_after_publish() {
        let session = Arc::new(AnalysisSession::new());
        let upload = session.begin_upload();

        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_ready(upload).await })
        };

        tokio::task::yield_now().await;
        session.publish(upload, AnalysisResult::default());

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(result.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_wait_ready_returns_immediately_when_ready() {
        let session = AnalysisSession::new();
        let upload = session.begin_upload();
        session.publish(upload, AnalysisResult::default());
        let result = tokio::time::timeout(Duration::from_millis(100), session.wait_ready(upload)).await;
        assert!(result.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reused_session_waits_for_its_own_upload() {
        let session = Arc::new(AnalysisSession::new());
        let old = session.begin_upload();
        session.publish(old, result_with_total(999.0));

        let new = session.begin_upload();
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_ready(new).await })
        };

        tokio::task::yield_now().await;
        session.publish(new, result_with_total(5.0));

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(result.stats.total_consumption, 5.0);
    }

    #[tokio::test]
    async fn test_waiter_on_superseded_upload_gets_none() {
        let session = Arc::new(AnalysisSession::new());
        let old = session.begin_upload();

        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.wait_ready(old).await })
        };

        tokio::task::yield_now().await;
        let new = session.begin_upload();
        session.publish(new, AnalysisResult::default());

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_none());
    }
}
