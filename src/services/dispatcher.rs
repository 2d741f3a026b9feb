//! Optimization dispatch: generative backend first, heuristic synthesizer
//! as the fallback that always succeeds.

use crate::{
    models::{
        metadata::MetadataRecord,
        optimization::{DESCRIPTION_LIMIT, OptimizationResult, OptimizedVariation, TITLE_LIMIT},
    },
    services::{
        generative::{BackendError, GenerativeBackend, build_prompt},
        synthesizer::{synthesize, truncate},
    },
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const VARIATION_COUNT: usize = 3;
const MISSING_REASONING: &str = "No reasoning provided.";

/// Shape the generative backend is asked to answer with.
#[derive(Debug, Deserialize)]
struct GenerativePayload {
    #[serde(default)]
    variations: Option<Vec<OptimizedVariation>>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Clone)]
pub struct OptimizationDispatcher {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl OptimizationDispatcher {
    /// `None` disables the generative path entirely.
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }

    /// Whether a generative backend is configured.
    pub fn is_generative(&self) -> bool {
        self.backend.is_some()
    }

    /// Produce an `OptimizationResult` for `record`. Never fails.
    pub async fn optimize(&self, record: &MetadataRecord, url: &str) -> OptimizationResult {
        let Some(backend) = &self.backend else {
            debug!(%url, "no generative backend configured, using rule engine");
            return synthesize(record, url);
        };

        match self.try_generative(backend.as_ref(), record, url).await {
            Ok(result) => {
                info!(backend = backend.name(), %url, "generative optimization succeeded");
                result
            }
            Err(err) => {
                warn!(
                    backend = backend.name(),
                    %url,
                    error = %err,
                    "generative optimization failed, falling back to rule engine"
                );
                synthesize(record, url)
            }
        }
    }

    async fn try_generative(
        &self,
        backend: &dyn GenerativeBackend,
        record: &MetadataRecord,
        url: &str,
    ) -> Result<OptimizationResult, BackendError> {
        let value = backend.generate(&build_prompt(record, url)).await?;
        let (variations, reasoning) = validate_payload(value)?;

        let mut variations: Vec<OptimizedVariation> = variations
            .into_iter()
            .take(VARIATION_COUNT)
            .map(clamp_variation)
            .collect();
        if variations.len() < VARIATION_COUNT {
            // Fill the missing angles from the rule engine, in order.
            let fallback = synthesize(record, url).variations;
            variations.extend(fallback.into_iter().skip(variations.len()));
        }

        Ok(OptimizationResult {
            original: record.clone(),
            variations,
            reasoning,
        })
    }
}

fn validate_payload(value: Value) -> Result<(Vec<OptimizedVariation>, String), BackendError> {
    let payload: GenerativePayload =
        serde_json::from_value(value).map_err(BackendError::InvalidSchema)?;

    let variations = payload
        .variations
        .filter(|v| !v.is_empty())
        .ok_or(BackendError::EmptyVariations)?;
    let reasoning = payload
        .reasoning
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| MISSING_REASONING.to_string());

    Ok((variations, reasoning))
}

fn clamp_variation(v: OptimizedVariation) -> OptimizedVariation {
    OptimizedVariation {
        title: truncate(v.title.trim(), TITLE_LIMIT),
        meta_description: truncate(v.meta_description.trim(), DESCRIPTION_LIMIT),
        og_image_suggestion: v.og_image_suggestion,
    }
}
