use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use services::{
    dispatcher::OptimizationDispatcher,
    fetcher::ResilientFetcher,
    generative::{GeminiBackend, GenerativeBackend},
    history::HistoryLog,
    rate_limiter::RateLimiter,
    seo_service::SeoService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config + one-shot flag ---
    let (cfg, analyze_url) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting meta-align with config: {:?}", cfg);

    // --- Initialize core service ---
    let service = build_service(&cfg)?;

    // --- Handle one-shot mode ---
    if let Some(url) = analyze_url {
        let record = service
            .scrape(&url)
            .await
            .with_context(|| format!("scraping {}", url))?;
        let result = service.refine(&record, &record.url).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(()); // exit after analysis
    }

    // --- Build router ---
    let limiter = Arc::new(RateLimiter::new(cfg.rate_limit_max, cfg.rate_limit_window));
    let app: Router = routes::routes::routes(limiter).with_state(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire fetcher, optimizer and history into the shared service.
fn build_service(cfg: &config::AppConfig) -> Result<SeoService> {
    let fetcher = ResilientFetcher::new(cfg.fetch_timeout).context("building HTTP client")?;

    let backend: Option<Arc<dyn GenerativeBackend>> = match &cfg.gemini_api_key {
        Some(key) => {
            let gemini: Arc<dyn GenerativeBackend> = Arc::new(GeminiBackend::new(
                key.clone(),
                cfg.gemini_model.clone(),
                cfg.gemini_endpoint.clone(),
            )
            .context("building Gemini client")?);
            tracing::info!("Generative optimization enabled ({})", cfg.gemini_model);
            Some(gemini)
        }
        None => {
            tracing::info!("No Gemini API key configured; using the rule engine only");
            None
        }
    };

    Ok(SeoService::new(
        fetcher,
        OptimizationDispatcher::new(backend),
        HistoryLog::default(),
    ))
}
