//! Defines routes for the metadata analysis API.
//!
//! ## Structure
//! - **Probes** (not rate limited)
//!   - `GET    /healthz`: liveness
//!   - `GET    /readyz` : readiness and active optimizer path
//!
//! - **API endpoints** (rate limited per client)
//!   - `POST   /api/scrape` : fetch a page and extract its SEO tags
//!   - `POST   /api/refine` : optimize a previously extracted record
//!   - `POST   /api/analyze`: scrape and refine in one call
//!   - `GET    /api/history`: recent analyses
//!   - `DELETE /api/history`: forget recent analyses

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        rate_limit::enforce_rate_limit,
        seo_handlers::{analyze, clear_history, list_history, refine, scrape},
    },
    services::{rate_limiter::RateLimiter, seo_service::SeoService},
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

/// Build and return the router for all endpoints.
///
/// The router carries shared state (`SeoService`) to all handlers; the rate
/// limiter only wraps the `/api` routes.
pub fn routes(limiter: Arc<RateLimiter>) -> Router<SeoService> {
    let api = Router::new()
        .route("/api/scrape", post(scrape))
        .route("/api/refine", post(refine))
        .route("/api/analyze", post(analyze))
        .route("/api/history", get(list_history).delete(clear_history))
        .route_layer(middleware::from_fn_with_state(limiter, enforce_rate_limit));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(api)
}
