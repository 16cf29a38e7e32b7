//! Enrichment driver
//!
//! Runs the catalog lookup → match → extract → persist pipeline for single
//! manga and sequential batches. Enrichment is a best-effort enhancement
//! layer: lookup failures degrade to a no-match outcome and must never block
//! the content pipeline they augment. Store write failures are real errors.

use std::time::Duration;

use chrono::Utc;
use mshelf_common::time::within_cooldown;
use mshelf_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::mangadex_client::CatalogSearch;
use super::metadata_extractor::extract_metadata;
use super::title_matcher::best_match;
use crate::db::manga::{self, MangaRecord};
use crate::models::{
    BatchItemResult, BatchReport, EnrichmentOutcome, EnrichmentStats, MatchSummary,
};

/// Fixed inter-item delay in batch mode; together with the client-side rate
/// limiter this keeps throughput under the catalog's 5 req/s limit
const BATCH_ITEM_DELAY: Duration = Duration::from_millis(250);

/// Default and maximum batch sizes
pub const DEFAULT_BATCH_LIMIT: i64 = 10;
pub const MAX_BATCH_LIMIT: i64 = 100;

/// Metadata enrichment driver
///
/// The store pool and the catalog client are explicit dependencies; batch
/// processing is strictly sequential, one item at a time.
pub struct Enricher<C> {
    db: SqlitePool,
    catalog: C,
}

impl<C: CatalogSearch + Send + Sync> Enricher<C> {
    pub fn new(db: SqlitePool, catalog: C) -> Self {
        Self { db, catalog }
    }

    /// Enrich one manga by internal id
    pub async fn enrich_by_id(&self, id: Uuid, force: bool) -> Result<EnrichmentOutcome> {
        let record = manga::load_manga(&self.db, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Manga {} not in store", id)))?;
        self.enrich_record(&record, force).await
    }

    /// Enrich one manga by content-provider id
    pub async fn enrich_by_api_id(&self, api_id: &str, force: bool) -> Result<EnrichmentOutcome> {
        let record = manga::load_manga_by_api_id(&self.db, api_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Manga api_id {} not in store", api_id)))?;
        self.enrich_record(&record, force).await
    }

    /// Enrich one loaded record
    ///
    /// Skips inside the cooldown window unless forced. On a match, persists
    /// the full metadata payload; on no match, persists only the sync stamp
    /// so failed lookups are not retried every batch run.
    pub async fn enrich_record(
        &self,
        record: &MangaRecord,
        force: bool,
    ) -> Result<EnrichmentOutcome> {
        if !force {
            if let Some(last_synced_at) = record.last_synced() {
                if within_cooldown(last_synced_at, Utc::now()) {
                    tracing::debug!(
                        manga_id = %record.id,
                        last_synced_at = %last_synced_at,
                        "Skipping enrichment (cooldown)"
                    );
                    return Ok(EnrichmentOutcome::Skipped { last_synced_at });
                }
            }
        }

        // Lookup failures are recovered here: enrichment is best-effort
        let candidates = match self.catalog.search_title(&record.title).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(
                    manga_id = %record.id,
                    title = %record.title,
                    error = %e,
                    "Catalog search failed, treating as no match"
                );
                Vec::new()
            }
        };
        let candidate_count = candidates.len();

        match best_match(&record.title, &candidates) {
            Some(best) => {
                let metadata = extract_metadata(best.candidate);
                manga::apply_metadata(&self.db, record.id, &metadata).await?;

                tracing::info!(
                    manga_id = %record.id,
                    title = %record.title,
                    mangadex_id = %metadata.mangadex_id,
                    score = best.score,
                    "Manga enriched"
                );

                Ok(EnrichmentOutcome::Matched {
                    summary: MatchSummary {
                        mangadex_id: metadata.mangadex_id,
                        score: best.score,
                        authors: metadata.authors,
                        artists: metadata.artists,
                        tag_count: metadata.tags.len(),
                    },
                })
            }
            None => {
                manga::stamp_sync_time(&self.db, record.id, Utc::now()).await?;

                let reason = if candidate_count == 0 {
                    "no candidates returned".to_string()
                } else {
                    format!(
                        "no candidate cleared the similarity threshold ({} searched)",
                        candidate_count
                    )
                };
                tracing::info!(
                    manga_id = %record.id,
                    title = %record.title,
                    reason = %reason,
                    "No catalog match"
                );

                Ok(EnrichmentOutcome::NotMatched { reason })
            }
        }
    }

    /// Enrich up to `limit` pending manga sequentially
    ///
    /// A fixed delay precedes every item to respect the catalog rate limit.
    /// One item's failure is recorded and never aborts the rest.
    pub async fn enrich_batch(&self, limit: i64, force: bool) -> Result<BatchReport> {
        let records = manga::find_pending_manga(&self.db, limit, force).await?;

        tracing::info!(
            selected = records.len(),
            limit,
            force,
            "Starting enrichment batch"
        );

        let mut report = BatchReport {
            processed: 0,
            matched: 0,
            failed: 0,
            results: Vec::with_capacity(records.len()),
        };

        for record in &records {
            tokio::time::sleep(BATCH_ITEM_DELAY).await;
            report.processed += 1;

            match self.enrich_record(record, force).await {
                Ok(outcome) => {
                    if outcome.is_matched() {
                        report.matched += 1;
                    }
                    report.results.push(item_result(record, &outcome));
                }
                Err(e) => {
                    tracing::error!(
                        manga_id = %record.id,
                        title = %record.title,
                        error = %e,
                        "Enrichment failed for batch item"
                    );
                    report.failed += 1;
                    report.results.push(BatchItemResult {
                        manga_id: record.id.to_string(),
                        title: record.title.clone(),
                        status: "failed".to_string(),
                        score: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            matched = report.matched,
            failed = report.failed,
            "Enrichment batch complete"
        );

        Ok(report)
    }

    /// Read-only enrichment coverage aggregate
    pub async fn stats(&self) -> Result<EnrichmentStats> {
        let (total, enriched, pending) = manga::enrichment_counts(&self.db).await?;
        Ok(EnrichmentStats::new(total, enriched, pending))
    }
}

fn item_result(record: &MangaRecord, outcome: &EnrichmentOutcome) -> BatchItemResult {
    let (status, score) = match outcome {
        EnrichmentOutcome::Matched { summary } => ("matched", Some(summary.score)),
        EnrichmentOutcome::NotMatched { .. } => ("not_matched", None),
        EnrichmentOutcome::Skipped { .. } => ("skipped", None),
    };

    BatchItemResult {
        manga_id: record.id.to_string(),
        title: record.title.clone(),
        status: status.to_string(),
        score,
        error: None,
    }
}
