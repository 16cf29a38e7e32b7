//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::models::EnrichmentStats;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "degraded")
    pub status: String,
    /// Module name ("mshelf-me")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Enrichment coverage aggregate; absent if the store is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<EnrichmentStats>,
}

/// GET /health
///
/// Liveness plus the enrichment coverage aggregate. A store failure degrades
/// the status instead of erroring: health must always answer.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let (status, stats) = match state.enricher.stats().await {
        Ok(stats) => ("ok", Some(stats)),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read enrichment stats");
            ("degraded", None)
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "mshelf-me".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        stats,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
