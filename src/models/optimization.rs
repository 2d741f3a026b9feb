//! Optimized tag sets produced from a `MetadataRecord`.

use super::metadata::MetadataRecord;
use serde::{Deserialize, Serialize};

/// Maximum title length, in characters.
pub const TITLE_LIMIT: usize = 60;

/// Maximum meta description length, in characters.
pub const DESCRIPTION_LIMIT: usize = 160;

/// One replacement tag set.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedVariation {
    /// Suggested `<title>`, at most `TITLE_LIMIT` characters.
    pub title: String,

    /// Suggested meta description, at most `DESCRIPTION_LIMIT` characters.
    pub meta_description: String,

    /// Free-text description of what the og:image should show.
    pub og_image_suggestion: String,
}

/// The outcome of one optimization run.
///
/// `variations` always holds three entries, ordered keyword-focused,
/// benefit-driven, action-oriented.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// The record the variations were derived from.
    pub original: MetadataRecord,

    pub variations: Vec<OptimizedVariation>,

    /// Human-readable summary of the optimization.
    pub reasoning: String,
}
