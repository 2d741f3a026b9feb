//! Entries of the in-memory analysis history.

use super::{metadata::MetadataRecord, optimization::OptimizationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one analysis.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Scraping,
    Refining,
    Complete,
    Error,
}

/// A single scrape-then-refine run, as kept in the history log.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Unique id; saving a record with a known id replaces it in place.
    pub id: Uuid,

    /// URL as submitted by the client.
    pub url: String,

    /// When the analysis started.
    pub scraped_at: DateTime<Utc>,

    /// Extracted metadata, once the fetch stage succeeded.
    pub original: Option<MetadataRecord>,

    /// Optimization output, once the refine stage finished.
    pub refined: Option<OptimizationResult>,

    pub status: AnalysisStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisRecord {
    /// Start a new record in the `scraping` state.
    pub fn start(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            scraped_at: Utc::now(),
            original: None,
            refined: None,
            status: AnalysisStatus::Scraping,
            error: None,
        }
    }
}
