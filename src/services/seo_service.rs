//! SeoService: the fetch → extract → optimize pipeline plus the analysis
//! history, bundled as the shared state of every HTTP handler.
//!
//! Each stage returns a fresh value; nothing is mutated across stages.

use crate::{
    models::{
        analysis::{AnalysisRecord, AnalysisStatus},
        metadata::MetadataRecord,
        optimization::OptimizationResult,
    },
    services::{
        dispatcher::OptimizationDispatcher,
        fetcher::{FetchError, ResilientFetcher},
        history::HistoryLog,
    },
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SeoService {
    pub fetcher: Arc<ResilientFetcher>,
    pub dispatcher: Arc<OptimizationDispatcher>,
    pub history: Arc<HistoryLog>,
}

impl SeoService {
    pub fn new(
        fetcher: ResilientFetcher,
        dispatcher: OptimizationDispatcher,
        history: HistoryLog,
    ) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            dispatcher: Arc::new(dispatcher),
            history: Arc::new(history),
        }
    }

    /// Fetch `url` and extract its metadata.
    pub async fn scrape(&self, url: &str) -> Result<MetadataRecord, FetchError> {
        self.fetcher.fetch(url).await
    }

    /// Optimize an already extracted record. Never fails.
    pub async fn refine(&self, record: &MetadataRecord, url: &str) -> OptimizationResult {
        self.dispatcher.optimize(record, url).await
    }

    /// Scrape then refine, recording every state transition in the history.
    ///
    /// The failed record is saved too, so clients can see what went wrong.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisRecord, (AnalysisRecord, FetchError)> {
        let mut record = AnalysisRecord::start(url);
        self.history.save(record.clone());

        let original = match self.scrape(url).await {
            Ok(original) => original,
            Err(err) => {
                warn!(%url, error = %err, "analysis failed");
                record.status = AnalysisStatus::Error;
                record.error = Some(err.to_string());
                self.history.save(record.clone());
                return Err((record, err));
            }
        };

        record.status = AnalysisStatus::Refining;
        record.original = Some(original.clone());
        self.history.save(record.clone());

        let refined = self.refine(&original, &original.url).await;
        record.status = AnalysisStatus::Complete;
        record.refined = Some(refined);
        self.history.save(record.clone());

        info!(%url, id = %record.id, "analysis complete");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fetcher::DEFAULT_FETCH_TIMEOUT;
    use httpmock::prelude::*;

    fn service() -> SeoService {
        SeoService::new(
            ResilientFetcher::new(DEFAULT_FETCH_TIMEOUT).unwrap(),
            OptimizationDispatcher::new(None),
            HistoryLog::default(),
        )
    }

    #[tokio::test]
    async fn analyze_runs_the_pipeline_and_records_it() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<title>Example Domain</title>");
            })
            .await;
        let svc = service();

        let record = svc.analyze(&server.url("/")).await.unwrap();

        assert_eq!(record.status, AnalysisStatus::Complete);
        let original = record.original.as_ref().unwrap();
        assert_eq!(original.title.as_deref(), Some("Example Domain"));
        let refined = record.refined.as_ref().unwrap();
        assert_eq!(refined.variations.len(), 3);
        assert!(refined.reasoning.contains("Missing meta description"));

        let history = svc.history.list();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, record.id);
        assert_eq!(history[0].status, AnalysisStatus::Complete);
    }

    #[tokio::test]
    async fn failed_analysis_is_kept_with_error_status() {
        let svc = service();

        let (record, err) = svc.analyze("http://bad host").await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert_eq!(record.status, AnalysisStatus::Error);
        assert!(record.error.is_some());
        assert_eq!(svc.history.list()[0].status, AnalysisStatus::Error);
    }
}
