//! HTTP handlers for the metadata pipeline.
//! Request validation happens here; everything else is delegated to
//! `SeoService`.

use crate::{
    errors::AppError,
    models::{
        analysis::AnalysisRecord, metadata::MetadataRecord, optimization::OptimizationResult,
    },
    services::seo_service::SeoService,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

/// Body of `POST /api/scrape` and `POST /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: Option<String>,
}

/// Body of `POST /api/refine`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub scraped_data: Option<MetadataRecord>,
    pub url: Option<String>,
}

fn required_url(payload: Result<Json<UrlRequest>, JsonRejection>) -> Result<String, AppError> {
    let Json(req) = payload?;
    req.url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("A valid URL is required"))
}

/// `POST /api/scrape`: fetch a page and return its extracted metadata.
pub async fn scrape(
    State(service): State<SeoService>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<MetadataRecord>, AppError> {
    let url = required_url(payload)?;
    let record = service.scrape(&url).await?;
    Ok(Json(record))
}

/// `POST /api/refine`: optimize a previously scraped record.
pub async fn refine(
    State(service): State<SeoService>,
    payload: Result<Json<RefineRequest>, JsonRejection>,
) -> Result<Json<OptimizationResult>, AppError> {
    let Json(req) = payload?;
    let (Some(record), Some(url)) = (req.scraped_data, req.url.filter(|u| !u.trim().is_empty()))
    else {
        return Err(AppError::bad_request("scrapedData and url are required"));
    };

    Ok(Json(service.refine(&record, &url).await))
}

/// `POST /api/analyze`: scrape and refine in one call, recorded in history.
pub async fn analyze(
    State(service): State<SeoService>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<AnalysisRecord>, AppError> {
    let url = required_url(payload)?;
    match service.analyze(&url).await {
        Ok(record) => Ok(Json(record)),
        Err((_record, err)) => Err(err.into()),
    }
}

/// `GET /api/history`: recent analyses, newest first.
pub async fn list_history(State(service): State<SeoService>) -> Json<Vec<AnalysisRecord>> {
    Json(service.history.list())
}

/// `DELETE /api/history`
pub async fn clear_history(State(service): State<SeoService>) -> impl IntoResponse {
    service.history.clear();
    StatusCode::NO_CONTENT
}
