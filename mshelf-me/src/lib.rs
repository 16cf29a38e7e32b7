//! mshelf-me - Metadata Enrichment Microservice
//!
//! Associates locally-synced manga records with the MangaDex catalog and
//! merges structured metadata (authors, artists, tags, alt titles, content
//! rating, description) into the local store. Exposes single, batch, and
//! coverage-reporting endpoints over HTTP.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::services::{Enricher, MangaDexClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Enrichment driver over the MangaDex catalog
    pub enricher: Arc<Enricher<MangaDexClient>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, catalog: MangaDexClient) -> Self {
        Self {
            db: db.clone(),
            enricher: Arc::new(Enricher::new(db, catalog)),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::enrichment_routes())
        .merge(api::health_routes())
        .with_state(state)
}
