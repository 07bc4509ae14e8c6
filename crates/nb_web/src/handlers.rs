use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use nb_core::config::DEFAULT_DELETE_COUNT;
use nb_core::{classifier_input, Article, Error};
use nb_scrapers::{IngestOutcome, IngestRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub message: String,
    pub added: usize,
    pub duplicates_skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub bias: u8,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: usize,
}

pub async fn home() -> Json<Value> {
    Json(json!({ "message": "Welcome to the News Bias API" }))
}

pub async fn scrape(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<ScrapeResponse> {
    let Json(request) = payload?;
    let response = match state.manager.ingest(request).await? {
        IngestOutcome::Completed(report) => ScrapeResponse {
            message: "Scraping completed!".to_string(),
            added: report.added,
            duplicates_skipped: report.duplicates_skipped,
        },
        IngestOutcome::NoValidResults => ScrapeResponse {
            message: "No valid results".to_string(),
            added: 0,
            duplicates_skipped: 0,
        },
    };
    Ok(Json(response))
}

pub async fn cache(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Article>> {
    let articles = state.manager.store().list_all().await?;
    if articles.is_empty() {
        return Err(ApiError::not_found("No cached data found. Please scrape first."));
    }
    Ok(Json(articles))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Vec<Article>> {
    let Json(request) = payload?;
    let articles = state.manager.store().search(&request.keyword).await?;
    if articles.is_empty() {
        return Err(ApiError::not_found("No articles found"));
    }
    info!("🔎 {} articles match '{}'", articles.len(), request.keyword.trim());
    Ok(Json(articles))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResult<PredictResponse> {
    let Json(request) = payload?;
    let input = classifier_input(request.title.as_deref(), &request.text)
        .ok_or_else(|| Error::InvalidRequest("No text provided".to_string()))?;

    let bias = state.classifier.predict(&input).await?;
    Ok(Json(PredictResponse {
        bias: bias.as_index(),
        label: bias.label(),
    }))
}

pub async fn delete_oldest(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> ApiResult<DeleteResponse> {
    let Query(params) = params?;
    let count = params.count.unwrap_or(DEFAULT_DELETE_COUNT);
    let deleted = state.manager.delete_oldest(count).await?;
    Ok(Json(DeleteResponse {
        message: format!("Deleted {} documents", deleted),
        deleted,
    }))
}
