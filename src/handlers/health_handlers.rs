//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness plus which optimizer path is active

use crate::services::seo_service::SeoService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Very small liveness probe; always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Reports whether optimization requests go through the generative backend
/// or straight to the rule engine. The rule engine has no external
/// dependency, so the service is ready as soon as it is listening.
pub async fn readyz(State(service): State<SeoService>) -> impl IntoResponse {
    let optimizer = if service.dispatcher.is_generative() {
        "generative"
    } else {
        "heuristic"
    };

    (
        StatusCode::OK,
        Json(ReadyResponse {
            status: "ok".into(),
            optimizer: optimizer.into(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    optimizer: String,
}
