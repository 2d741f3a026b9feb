//! Resilient HTML retrieval.
//!
//! A fetch walks a fixed list of request identities (strategies) in order and
//! stops at the first one whose page carries a usable signal. Individual
//! attempt failures never surface directly; they only advance the walk.

use crate::{models::metadata::MetadataRecord, services::extractor::extract_metadata};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, USER_AGENT},
    redirect,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const CRAWLER_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
pub const MINIMAL_USER_AGENT: &str = "MetaAlign/1.0";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

/// One request identity attempted against the target origin.
#[derive(Debug, Clone, Copy)]
pub struct FetchStrategy {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: Option<&'static str>,
    pub bypass_cache: bool,
}

/// Strategies in the order they are attempted.
pub const STRATEGIES: [FetchStrategy; 3] = [
    FetchStrategy {
        name: "browser",
        user_agent: BROWSER_USER_AGENT,
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        accept_language: Some("en-US,en;q=0.9"),
        bypass_cache: true,
    },
    FetchStrategy {
        name: "crawler",
        user_agent: CRAWLER_USER_AGENT,
        accept: "text/html",
        accept_language: None,
        bypass_cache: false,
    },
    FetchStrategy {
        name: "minimal",
        user_agent: MINIMAL_USER_AGENT,
        accept: "text/html",
        accept_language: None,
        bypass_cache: false,
    },
];

/// Why a single strategy attempt was not accepted.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {0}")]
    UpstreamHttp(StatusCode),
    #[error("not HTML (got `{0}`)")]
    NotHtml(String),
    #[error("no usable metadata (title, meta description, og:image all missing)")]
    NoSignal,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Errors surfaced to callers of [`ResilientFetcher::fetch`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },
    #[error("all {attempts} fetch strategies failed for {url}: {source}")]
    Exhausted {
        url: String,
        attempts: usize,
        source: AttemptError,
    },
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Trim user input, default the scheme to `https://`, and validate.
///
/// Returns the normalized string as typed (no trailing-slash rewriting), which
/// is also what ends up in the record's `url` field.
pub fn normalize_url(input: &str) -> FetchResult<String> {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    let normalized = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&normalized).map_err(|err| FetchError::InvalidUrl {
        input: input.to_string(),
        reason: err.to_string(),
    })?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl {
            input: input.to_string(),
            reason: "missing host".into(),
        });
    }

    Ok(normalized)
}

/// Fetches a page through the strategy chain and extracts its metadata.
#[derive(Clone)]
pub struct ResilientFetcher {
    client: Client,
    timeout: Duration,
}

impl ResilientFetcher {
    /// Build a fetcher whose attempts are each bounded by `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client, timeout })
    }

    /// Normalize `input`, then try each strategy until one yields a record
    /// with at least one signal.
    ///
    /// Strategies run sequentially; a later one is only requested when the
    /// previous one failed or came back empty.
    pub async fn fetch(&self, input: &str) -> FetchResult<MetadataRecord> {
        let url = normalize_url(input)?;
        let mut last_error = AttemptError::NoSignal;

        for strategy in &STRATEGIES {
            debug!(strategy = strategy.name, %url, "attempting fetch");
            match self.attempt(&url, strategy).await {
                Ok(record) if record.has_signal() => {
                    info!(strategy = strategy.name, %url, "fetch accepted");
                    return Ok(record);
                }
                Ok(_) => {
                    warn!(
                        strategy = strategy.name,
                        %url,
                        "fetch returned no useful tags, trying next strategy"
                    );
                    last_error = AttemptError::NoSignal;
                }
                Err(err) => {
                    warn!(
                        strategy = strategy.name,
                        %url,
                        error = %err,
                        "fetch failed, trying next strategy"
                    );
                    last_error = err;
                }
            }
        }

        Err(FetchError::Exhausted {
            url,
            attempts: STRATEGIES.len(),
            source: last_error,
        })
    }

    async fn attempt(
        &self,
        url: &str,
        strategy: &FetchStrategy,
    ) -> Result<MetadataRecord, AttemptError> {
        let mut request = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(USER_AGENT, strategy.user_agent)
            .header(ACCEPT, strategy.accept);
        if let Some(language) = strategy.accept_language {
            request = request.header(ACCEPT_LANGUAGE, language);
        }
        if strategy.bypass_cache {
            request = request.header(CACHE_CONTROL, "no-cache");
        }

        let response = request.send().await.map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::UpstreamHttp(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_html(&content_type) {
            return Err(AttemptError::NotHtml(content_type));
        }

        let html = response.text().await.map_err(|err| self.classify(err))?;
        Ok(extract_metadata(&html, url))
    }

    fn classify(&self, err: reqwest::Error) -> AttemptError {
        if err.is_timeout() {
            AttemptError::Timeout(self.timeout)
        } else {
            AttemptError::Transport(err)
        }
    }
}

fn is_html(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const EMPTY_PAGE: &str = "<html><head></head><body><p>loading…</p></body></html>";
    const TITLED_PAGE: &str = "<html><head><title>Crawler View</title></head></html>";

    fn fetcher() -> ResilientFetcher {
        ResilientFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn normalize_adds_https_scheme() {
        assert_eq!(normalize_url("  example.com ").unwrap(), "https://example.com");
        assert_eq!(
            normalize_url("HTTP://example.com/a").unwrap(),
            "HTTP://example.com/a"
        );
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(matches!(
            normalize_url(""),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(matches!(
            normalize_url("http://exa mple.com"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn html_content_types() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/json"));
        assert!(!is_html(""));
    }

    #[tokio::test]
    async fn falls_back_to_crawler_and_stops() {
        let server = MockServer::start_async().await;
        let browser = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header("user-agent", BROWSER_USER_AGENT);
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .body(EMPTY_PAGE);
            })
            .await;
        let crawler = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header("user-agent", CRAWLER_USER_AGENT);
                then.status(200)
                    .header("content-type", "text/html")
                    .body(TITLED_PAGE);
            })
            .await;
        let minimal = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header("user-agent", MINIMAL_USER_AGENT);
                then.status(200)
                    .header("content-type", "text/html")
                    .body(TITLED_PAGE);
            })
            .await;

        let record = fetcher().fetch(&server.url("/")).await.unwrap();

        assert_eq!(record.title.as_deref(), Some("Crawler View"));
        assert_eq!(record.url, server.url("/"));
        browser.assert_hits_async(1).await;
        crawler.assert_hits_async(1).await;
        minimal.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn browser_strategy_sends_full_identity() {
        let server = MockServer::start_async().await;
        let browser = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/page")
                    .header("user-agent", BROWSER_USER_AGENT)
                    .header("accept-language", "en-US,en;q=0.9")
                    .header("cache-control", "no-cache");
                then.status(200)
                    .header("content-type", "text/html")
                    .body(r#"<meta name="description" content="Fast path.">"#);
            })
            .await;

        let record = fetcher().fetch(&server.url("/page")).await.unwrap();

        assert_eq!(record.meta_description.as_deref(), Some("Fast path."));
        browser.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn redirects_are_followed_but_record_keeps_requested_url() {
        let server = MockServer::start_async().await;
        let old = server
            .mock_async(|when, then| {
                when.method(GET).path("/old");
                then.status(301).header("location", "/new");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/new");
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<title>Moved</title>");
            })
            .await;

        let record = fetcher().fetch(&server.url("/old")).await.unwrap();

        assert_eq!(record.title.as_deref(), Some("Moved"));
        assert_eq!(record.url, server.url("/old"));
        old.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn upstream_errors_and_non_html_advance() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).header("user-agent", BROWSER_USER_AGENT);
                then.status(403).body("forbidden");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).header("user-agent", CRAWLER_USER_AGENT);
                then.status(200)
                    .header("content-type", "application/json")
                    .body("{}");
            })
            .await;
        let minimal = server
            .mock_async(|when, then| {
                when.method(GET).header("user-agent", MINIMAL_USER_AGENT);
                then.status(200)
                    .header("content-type", "text/html")
                    .body(r#"<meta property="og:image" content="/og.png">"#);
            })
            .await;

        let record = fetcher().fetch(&server.url("/")).await.unwrap();

        assert_eq!(record.og_image.as_deref(), Some("/og.png"));
        minimal.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn slow_strategy_times_out_and_advances() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).header("user-agent", BROWSER_USER_AGENT);
                then.status(200)
                    .header("content-type", "text/html")
                    .delay(Duration::from_secs(2))
                    .body(TITLED_PAGE);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).header("user-agent", CRAWLER_USER_AGENT);
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<title>Quick</title>");
            })
            .await;

        let fetcher = ResilientFetcher::new(Duration::from_millis(200)).unwrap();
        let record = fetcher.fetch(&server.url("/")).await.unwrap();

        assert_eq!(record.title.as_deref(), Some("Quick"));
    }

    #[tokio::test]
    async fn exhaustion_reports_last_cause() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(503);
            })
            .await;

        let err = fetcher().fetch(&server.url("/down")).await.unwrap_err();

        any.assert_hits_async(3).await;
        match err {
            FetchError::Exhausted {
                url,
                attempts,
                source,
            } => {
                assert_eq!(url, server.url("/down"));
                assert_eq!(attempts, 3);
                assert!(matches!(
                    source,
                    AttemptError::UpstreamHttp(StatusCode::SERVICE_UNAVAILABLE)
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_pages_everywhere_exhaust_with_no_signal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200)
                    .header("content-type", "text/html")
                    .body(EMPTY_PAGE);
            })
            .await;

        let err = fetcher().fetch(&server.url("/")).await.unwrap_err();

        assert!(matches!(
            err,
            FetchError::Exhausted {
                source: AttemptError::NoSignal,
                ..
            }
        ));
    }
}
