//! Generative optimization backend.
//!
//! The dispatcher only sees the [`GenerativeBackend`] capability: a prompt goes
//! in, a JSON value (or an error) comes out. [`GeminiBackend`] is the one real
//! implementation, talking to the Gemini `generateContent` REST endpoint.

use crate::models::metadata::MetadataRecord;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Value shipped in `.env.example`; treated the same as no key at all.
pub const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 200;

const SYSTEM_PROMPT: &str = r#"You are an expert Technical SEO consultant. Given the current SEO meta tags of a webpage, generate 3 optimized variations. Follow these rules strictly:

1. Title tags MUST be ≤60 characters. Include the primary keyword near the start.
2. Meta descriptions MUST be ≤160 characters. Include a clear call-to-action.
3. For og:image, provide a descriptive suggestion for what the image should contain.
4. Each variation should take a different angle (e.g., keyword-focused, benefit-driven, action-oriented).
5. If a tag is missing, create it from scratch based on the page content signals.

Respond ONLY with valid JSON in this exact format:
{
  "variations": [
    {
      "title": "...",
      "metaDescription": "...",
      "ogImageSuggestion": "..."
    }
  ],
  "reasoning": "Brief explanation of your optimization strategy"
}"#;

/// Any failure of the generative path. Never surfaced to API callers; the
/// dispatcher logs it and falls back to the heuristic synthesizer.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("generative backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generative backend returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("no response received from the model")]
    EmptyResponse,
    #[error("model response is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("model response does not match the expected schema: {0}")]
    InvalidSchema(#[source] serde_json::Error),
    #[error("invalid model response: missing variations array")]
    EmptyVariations,
}

/// Something that turns a prompt into a JSON document.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<Value, BackendError>;
}

/// Returns the key only if it is usable: present, non-blank, not the placeholder.
pub fn usable_api_key(key: Option<&str>) -> Option<&str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
}

/// Gemini REST client.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<Value, BackendError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 1000,
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status,
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        serde_json::from_str(&text).map_err(BackendError::MalformedJson)
    }
}

/// Full prompt for one record: system rules followed by the page's tags.
pub fn build_prompt(record: &MetadataRecord, url: &str) -> String {
    let show = |value: &Option<String>, missing: &'static str| -> String {
        value.clone().unwrap_or_else(|| missing.to_string())
    };

    let lines = [
        format!("URL: {url}"),
        String::new(),
        "Current SEO Tags:".to_string(),
        format!("- Title: {}", show(&record.title, "⚠️ MISSING")),
        format!(
            "- Meta Description: {}",
            show(&record.meta_description, "⚠️ MISSING")
        ),
        format!("- OG Image: {}", show(&record.og_image, "⚠️ MISSING")),
        String::new(),
        "Additional Page Signals:".to_string(),
        format!("- OG Title: {}", show(&record.og_title, "Not set")),
        format!(
            "- OG Description: {}",
            show(&record.og_description, "Not set")
        ),
        format!("- H1: {}", show(&record.h1, "Not found")),
        format!("- Canonical: {}", show(&record.canonical, "Not set")),
        String::new(),
        "Generate 3 optimized variations of the title, meta description, and og:image suggestion."
            .to_string(),
    ];

    format!("{SYSTEM_PROMPT}\n\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn placeholder_and_blank_keys_are_unusable() {
        assert_eq!(usable_api_key(None), None);
        assert_eq!(usable_api_key(Some("   ")), None);
        assert_eq!(usable_api_key(Some(PLACEHOLDER_API_KEY)), None);
        assert_eq!(usable_api_key(Some(" abc123 ")), Some("abc123"));
    }

    #[test]
    fn prompt_marks_absent_fields() {
        let record = MetadataRecord {
            url: "https://acme.com".into(),
            title: Some("Acme Shoes".into()),
            h1: None,
            ..Default::default()
        };
        let prompt = build_prompt(&record, "https://acme.com");

        assert!(prompt.starts_with("You are an expert Technical SEO consultant."));
        assert!(prompt.contains("URL: https://acme.com"));
        assert!(prompt.contains("- Title: Acme Shoes"));
        assert!(prompt.contains("- Meta Description: ⚠️ MISSING"));
        assert!(prompt.contains("- OG Image: ⚠️ MISSING"));
        assert!(prompt.contains("- OG Title: Not set"));
        assert!(prompt.contains("- H1: Not found"));
        assert!(prompt.contains("- Canonical: Not set"));
    }

    #[tokio::test]
    async fn gemini_returns_parsed_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/test-model:generateContent")
                    .header("x-goog-api-key", "secret");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": { "parts": [{ "text": "{\"variations\": [], \"reasoning\": \"ok\"}" }] }
                    }]
                }));
            })
            .await;

        let backend = GeminiBackend::new("secret", "test-model", server.base_url()).unwrap();
        let value = backend.generate("prompt").await.unwrap();

        mock.assert_async().await;
        assert_eq!(value["reasoning"], "ok");
    }

    #[tokio::test]
    async fn gemini_rejects_error_status_and_bad_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1beta/models/denied:generateContent");
                then.status(403).body("API key not valid");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1beta/models/chatty:generateContent");
                then.status(200).json_body(json!({
                    "candidates": [{ "content": { "parts": [{ "text": "Sure! Here are some ideas" }] } }]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1beta/models/silent:generateContent");
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let denied = GeminiBackend::new("k", "denied", server.base_url()).unwrap();
        assert!(matches!(
            denied.generate("p").await,
            Err(BackendError::Status { status: StatusCode::FORBIDDEN, .. })
        ));

        let chatty = GeminiBackend::new("k", "chatty", server.base_url()).unwrap();
        assert!(matches!(
            chatty.generate("p").await,
            Err(BackendError::MalformedJson(_))
        ));

        let silent = GeminiBackend::new("k", "silent", server.base_url()).unwrap();
        assert!(matches!(
            silent.generate("p").await,
            Err(BackendError::EmptyResponse)
        ));
    }
}
