//! Enrichment result and payload types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alternate title (language code + text)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AltTitle {
    pub lang: String,
    pub title: String,
}

/// Tag relation extracted from a catalog candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    pub id: String,
    /// Localized name: English, falling back to Japanese, then "Unknown"
    pub name: String,
    /// Group classification ("genre", "theme", "format", ...)
    pub group: Option<String>,
}

/// Flat metadata payload extracted from an accepted catalog candidate,
/// ready to merge into a local manga record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangaMetadata {
    /// External catalog id; a manga is "enriched" iff this is persisted
    pub mangadex_id: String,
    pub alt_titles: Vec<AltTitle>,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    pub tags: Vec<TagSummary>,
    pub original_language: Option<String>,
    pub publication_demographic: Option<String>,
    pub content_rating: Option<String>,
    pub description: Option<String>,
    /// Set to the extraction time; persisted as the last-synced stamp
    pub synced_at: DateTime<Utc>,
}

/// Summary of an accepted match, returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub mangadex_id: String,
    /// Best title similarity score that cleared the threshold
    pub score: f64,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    pub tag_count: usize,
}

/// Tri-state outcome of a single enrichment attempt
#[derive(Debug, Clone)]
pub enum EnrichmentOutcome {
    /// Last sync is within the cooldown window; nothing was done
    Skipped { last_synced_at: DateTime<Utc> },
    /// A candidate cleared the threshold and metadata was persisted
    Matched { summary: MatchSummary },
    /// No candidate cleared the threshold; only the sync stamp was persisted
    NotMatched { reason: String },
}

impl EnrichmentOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, EnrichmentOutcome::Matched { .. })
    }
}

/// Per-item entry in a batch report
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub manga_id: String,
    pub title: String,
    /// "matched" | "not_matched" | "skipped" | "failed"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Accumulated batch outcome
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub matched: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

/// Read-only enrichment coverage aggregate
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentStats {
    /// Total local manga count
    pub total: i64,
    /// Manga with a non-null catalog id
    pub enriched: i64,
    /// Manga with neither a catalog id nor a sync timestamp
    pub pending: i64,
    /// enriched/total as a percentage string ("42.0%")
    pub coverage: String,
}

impl EnrichmentStats {
    pub fn new(total: i64, enriched: i64, pending: i64) -> Self {
        let coverage = if total > 0 {
            format!("{:.1}%", enriched as f64 / total as f64 * 100.0)
        } else {
            "0.0%".to_string()
        };
        Self {
            total,
            enriched,
            pending,
            coverage,
        }
    }
}
