//! Manga store operations
//!
//! Reads local manga rows and writes the enrichment columns. Timestamps are
//! RFC3339 TEXT; list columns are JSON text serialized with serde_json.

use chrono::{DateTime, Utc};
use mshelf_common::time::{parse_db_timestamp, to_db_timestamp};
use mshelf_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::MangaMetadata;

/// Local manga row (the subset this service reads)
#[derive(Debug, Clone)]
pub struct MangaRecord {
    pub id: Uuid,
    /// Content-provider id assigned by the sync pipeline
    pub api_id: String,
    pub title: String,
    pub content_synced_at: Option<String>,
    /// External catalog id; non-null iff the manga is enriched
    pub mangadex_id: Option<String>,
    /// Last enrichment attempt, match or not; non-null iff attempted
    pub last_synced_at: Option<String>,
}

impl MangaRecord {
    /// Create a new local record for a provider manga (content sync path)
    pub fn new(api_id: String, title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            api_id,
            title,
            content_synced_at: Some(to_db_timestamp(Utc::now())),
            mangadex_id: None,
            last_synced_at: None,
        }
    }

    /// Parsed last-synced timestamp, if present and well-formed
    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
            .as_deref()
            .and_then(parse_db_timestamp)
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<MangaRecord> {
    let id_str: String = row.get("id");
    Ok(MangaRecord {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("Malformed manga id {}: {}", id_str, e)))?,
        api_id: row.get("api_id"),
        title: row.get("title"),
        content_synced_at: row.get("content_synced_at"),
        mangadex_id: row.get("mangadex_id"),
        last_synced_at: row.get("last_synced_at"),
    })
}

const RECORD_COLUMNS: &str = "id, api_id, title, content_synced_at, mangadex_id, last_synced_at";

/// Save a manga row (content sync upsert by api_id)
pub async fn save_manga(pool: &SqlitePool, manga: &MangaRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO manga (id, api_id, title, content_synced_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(api_id) DO UPDATE SET
            title = excluded.title,
            content_synced_at = excluded.content_synced_at
        "#,
    )
    .bind(manga.id.to_string())
    .bind(&manga.api_id)
    .bind(&manga.title)
    .bind(&manga.content_synced_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load manga by internal id
pub async fn load_manga(pool: &SqlitePool, id: Uuid) -> Result<Option<MangaRecord>> {
    let row = sqlx::query(&format!("SELECT {} FROM manga WHERE id = ?", RECORD_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Load manga by content-provider id
pub async fn load_manga_by_api_id(pool: &SqlitePool, api_id: &str) -> Result<Option<MangaRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM manga WHERE api_id = ?",
        RECORD_COLUMNS
    ))
    .bind(api_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Select up to `limit` manga needing enrichment, most-recently-content-synced
/// first
///
/// Pending means no catalog id and no prior sync attempt. A forced refresh
/// drops both conditions and re-syncs the most recent rows.
pub async fn find_pending_manga(
    pool: &SqlitePool,
    limit: i64,
    force: bool,
) -> Result<Vec<MangaRecord>> {
    let where_clause = if force {
        ""
    } else {
        "WHERE mangadex_id IS NULL AND last_synced_at IS NULL"
    };

    let rows = sqlx::query(&format!(
        "SELECT {} FROM manga {} ORDER BY content_synced_at DESC LIMIT ?",
        RECORD_COLUMNS, where_clause
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Merge an extracted metadata payload into a manga row
///
/// Fails with NotFound if the row vanished since it was selected.
pub async fn apply_metadata(pool: &SqlitePool, id: Uuid, metadata: &MangaMetadata) -> Result<()> {
    let alt_titles = serde_json::to_string(&metadata.alt_titles)
        .map_err(|e| Error::Internal(format!("Serialize alt_titles: {}", e)))?;
    let authors = serde_json::to_string(&metadata.authors)
        .map_err(|e| Error::Internal(format!("Serialize authors: {}", e)))?;
    let artists = serde_json::to_string(&metadata.artists)
        .map_err(|e| Error::Internal(format!("Serialize artists: {}", e)))?;
    let tags = serde_json::to_string(&metadata.tags)
        .map_err(|e| Error::Internal(format!("Serialize tags: {}", e)))?;

    let result = sqlx::query(
        r#"
        UPDATE manga SET
            mangadex_id = ?,
            alt_titles = ?,
            authors = ?,
            artists = ?,
            tags = ?,
            original_language = ?,
            publication_demographic = ?,
            content_rating = ?,
            description = ?,
            last_synced_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&metadata.mangadex_id)
    .bind(alt_titles)
    .bind(authors)
    .bind(artists)
    .bind(tags)
    .bind(&metadata.original_language)
    .bind(&metadata.publication_demographic)
    .bind(&metadata.content_rating)
    .bind(&metadata.description)
    .bind(to_db_timestamp(metadata.synced_at))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Manga {} not in store", id)));
    }

    Ok(())
}

/// Stamp the sync timestamp only (no-match outcome)
///
/// The catalog id and existing metadata columns are left untouched.
pub async fn stamp_sync_time(pool: &SqlitePool, id: Uuid, when: DateTime<Utc>) -> Result<()> {
    let result = sqlx::query("UPDATE manga SET last_synced_at = ? WHERE id = ?")
        .bind(to_db_timestamp(when))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Manga {} not in store", id)));
    }

    Ok(())
}

/// Aggregate enrichment coverage: (total, enriched, pending)
pub async fn enrichment_counts(pool: &SqlitePool) -> Result<(i64, i64, i64)> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(mangadex_id) AS enriched,
            COALESCE(SUM(CASE WHEN mangadex_id IS NULL AND last_synced_at IS NULL
                             THEN 1 ELSE 0 END), 0) AS pending
        FROM manga
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok((row.get("total"), row.get("enriched"), row.get("pending")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AltTitle, TagSummary};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn metadata(mangadex_id: &str) -> MangaMetadata {
        MangaMetadata {
            mangadex_id: mangadex_id.to_string(),
            alt_titles: vec![AltTitle {
                lang: "ja-ro".to_string(),
                title: "Wan Pisu".to_string(),
            }],
            authors: vec!["Eiichiro Oda".to_string()],
            artists: vec!["Eiichiro Oda".to_string()],
            tags: vec![TagSummary {
                id: "tag-action".to_string(),
                name: "Action".to_string(),
                group: Some("genre".to_string()),
            }],
            original_language: Some("ja".to_string()),
            publication_demographic: Some("shounen".to_string()),
            content_rating: Some("safe".to_string()),
            description: Some("Pirates.".to_string()),
            synced_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_manga() {
        let pool = test_pool().await;

        let manga = MangaRecord::new("api-123".to_string(), "One Piece".to_string());
        save_manga(&pool, &manga).await.unwrap();

        let loaded = load_manga(&pool, manga.id).await.unwrap().unwrap();
        assert_eq!(loaded.api_id, "api-123");
        assert_eq!(loaded.title, "One Piece");
        assert!(loaded.mangadex_id.is_none());
        assert!(loaded.last_synced_at.is_none());

        let by_api_id = load_manga_by_api_id(&pool, "api-123").await.unwrap().unwrap();
        assert_eq!(by_api_id.id, manga.id);
    }

    #[tokio::test]
    async fn test_apply_metadata_round_trip() {
        let pool = test_pool().await;

        let manga = MangaRecord::new("api-123".to_string(), "One Piece".to_string());
        save_manga(&pool, &manga).await.unwrap();

        apply_metadata(&pool, manga.id, &metadata("md-1")).await.unwrap();

        let loaded = load_manga(&pool, manga.id).await.unwrap().unwrap();
        assert_eq!(loaded.mangadex_id.as_deref(), Some("md-1"));
        assert!(loaded.last_synced().is_some());

        // JSON columns parse back
        let row = sqlx::query("SELECT authors, tags FROM manga WHERE id = ?")
            .bind(manga.id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        let authors: Vec<String> =
            serde_json::from_str(&row.get::<String, _>("authors")).unwrap();
        assert_eq!(authors, vec!["Eiichiro Oda"]);
        let tags: Vec<TagSummary> = serde_json::from_str(&row.get::<String, _>("tags")).unwrap();
        assert_eq!(tags[0].name, "Action");
    }

    #[tokio::test]
    async fn test_apply_metadata_missing_row() {
        let pool = test_pool().await;
        let result = apply_metadata(&pool, Uuid::new_v4(), &metadata("md-1")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stamp_sync_time_leaves_catalog_id_null() {
        let pool = test_pool().await;

        let manga = MangaRecord::new("api-123".to_string(), "Unknown Manga".to_string());
        save_manga(&pool, &manga).await.unwrap();

        stamp_sync_time(&pool, manga.id, Utc::now()).await.unwrap();

        let loaded = load_manga(&pool, manga.id).await.unwrap().unwrap();
        assert!(loaded.mangadex_id.is_none());
        assert!(loaded.last_synced().is_some());
    }

    #[tokio::test]
    async fn test_find_pending_excludes_attempted_and_enriched() {
        let pool = test_pool().await;

        let pending = MangaRecord::new("api-1".to_string(), "Pending".to_string());
        let attempted = MangaRecord::new("api-2".to_string(), "Attempted".to_string());
        let enriched = MangaRecord::new("api-3".to_string(), "Enriched".to_string());
        for manga in [&pending, &attempted, &enriched] {
            save_manga(&pool, manga).await.unwrap();
        }
        stamp_sync_time(&pool, attempted.id, Utc::now()).await.unwrap();
        apply_metadata(&pool, enriched.id, &metadata("md-3")).await.unwrap();

        let selected = find_pending_manga(&pool, 10, false).await.unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, pending.id);

        // Forced refresh selects everything
        let forced = find_pending_manga(&pool, 10, true).await.unwrap();
        assert_eq!(forced.len(), 3);
    }

    #[tokio::test]
    async fn test_find_pending_orders_most_recent_first_and_limits() {
        let pool = test_pool().await;

        let mut older = MangaRecord::new("api-old".to_string(), "Older".to_string());
        older.content_synced_at = Some("2026-08-01T00:00:00+00:00".to_string());
        let mut newer = MangaRecord::new("api-new".to_string(), "Newer".to_string());
        newer.content_synced_at = Some("2026-08-20T00:00:00+00:00".to_string());
        save_manga(&pool, &older).await.unwrap();
        save_manga(&pool, &newer).await.unwrap();

        let selected = find_pending_manga(&pool, 1, false).await.unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_enrichment_counts() {
        let pool = test_pool().await;

        let pending = MangaRecord::new("api-1".to_string(), "Pending".to_string());
        let attempted = MangaRecord::new("api-2".to_string(), "Attempted".to_string());
        let enriched = MangaRecord::new("api-3".to_string(), "Enriched".to_string());
        for manga in [&pending, &attempted, &enriched] {
            save_manga(&pool, manga).await.unwrap();
        }
        stamp_sync_time(&pool, attempted.id, Utc::now()).await.unwrap();
        apply_metadata(&pool, enriched.id, &metadata("md-3")).await.unwrap();

        let (total, enriched_count, pending_count) = enrichment_counts(&pool).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(enriched_count, 1);
        assert_eq!(pending_count, 1);
    }
}
