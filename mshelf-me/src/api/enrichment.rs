//! Enrichment endpoints
//!
//! Single-item and batch enrichment plus the coverage aggregate. Expected
//! "no match" outcomes are structured results, not errors; only config and
//! store failures surface as error responses.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{BatchReport, EnrichmentOutcome, EnrichmentStats, MatchSummary};
use crate::services::enricher::{DEFAULT_BATCH_LIMIT, MAX_BATCH_LIMIT};
use crate::AppState;

/// Query parameters for single-item enrichment
#[derive(Debug, Default, Deserialize)]
pub struct EnrichQuery {
    /// Bypass the re-sync cooldown
    #[serde(default)]
    pub force: bool,
}

/// Single-item enrichment response
#[derive(Debug, Serialize)]
pub struct EnrichResponse {
    pub success: bool,
    pub matched: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MatchSummary>,
}

impl From<EnrichmentOutcome> for EnrichResponse {
    fn from(outcome: EnrichmentOutcome) -> Self {
        match outcome {
            EnrichmentOutcome::Matched { summary } => Self {
                success: true,
                matched: true,
                skipped: false,
                reason: None,
                metadata: Some(summary),
            },
            EnrichmentOutcome::NotMatched { reason } => Self {
                success: true,
                matched: false,
                skipped: false,
                reason: Some(reason),
                metadata: None,
            },
            EnrichmentOutcome::Skipped { last_synced_at } => Self {
                success: true,
                matched: false,
                skipped: true,
                reason: Some(format!(
                    "last synced {} (within cooldown)",
                    last_synced_at.to_rfc3339()
                )),
                metadata: None,
            },
        }
    }
}

/// Batch enrichment request body
#[derive(Debug, Default, Deserialize)]
pub struct BatchRequest {
    pub limit: Option<i64>,
    #[serde(default)]
    pub force_refresh: bool,
}

/// Batch enrichment response
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: BatchReport,
}

/// Coverage aggregate response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub status: String,
    pub stats: EnrichmentStats,
}

/// POST /enrich/manga/:id
pub async fn enrich_manga(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<EnrichQuery>,
) -> ApiResult<Json<EnrichResponse>> {
    let outcome = state.enricher.enrich_by_id(id, query.force).await?;
    Ok(Json(outcome.into()))
}

/// POST /enrich/manga/by-api-id/:api_id
pub async fn enrich_manga_by_api_id(
    State(state): State<AppState>,
    Path(api_id): Path<String>,
    Query(query): Query<EnrichQuery>,
) -> ApiResult<Json<EnrichResponse>> {
    let outcome = state.enricher.enrich_by_api_id(&api_id, query.force).await?;
    Ok(Json(outcome.into()))
}

/// POST /enrich/batch
pub async fn enrich_batch(
    State(state): State<AppState>,
    body: Option<Json<BatchRequest>>,
) -> ApiResult<Json<BatchResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let limit = request.limit.unwrap_or(DEFAULT_BATCH_LIMIT);

    if limit < 1 || limit > MAX_BATCH_LIMIT {
        return Err(crate::error::ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_BATCH_LIMIT
        )));
    }

    let report = state
        .enricher
        .enrich_batch(limit, request.force_refresh)
        .await?;

    Ok(Json(BatchResponse {
        success: true,
        report,
    }))
}

/// GET /enrich/stats
pub async fn enrichment_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.enricher.stats().await?;
    Ok(Json(StatsResponse {
        status: "ok".to_string(),
        stats,
    }))
}

/// Build enrichment routes
pub fn enrichment_routes() -> Router<AppState> {
    Router::new()
        .route("/enrich/manga/:id", post(enrich_manga))
        .route("/enrich/manga/by-api-id/:api_id", post(enrich_manga_by_api_id))
        .route("/enrich/batch", post(enrich_batch))
        .route("/enrich/stats", get(enrichment_stats))
}
