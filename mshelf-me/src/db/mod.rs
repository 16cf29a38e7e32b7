//! Database access for mshelf-me
//!
//! Shared SQLite database access. The manga table is owned by the content
//! sync pipeline; this service reads it and writes the enrichment columns.

pub mod manga;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize the manga table if the content sync pipeline has not created
/// it yet
///
/// Enrichment columns are all nullable and independently overwritable; list
/// columns hold JSON text.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manga (
            id                      TEXT PRIMARY KEY,
            api_id                  TEXT UNIQUE NOT NULL,
            title                   TEXT NOT NULL,
            content_synced_at       TEXT,
            mangadex_id             TEXT,
            alt_titles              TEXT,
            authors                 TEXT,
            artists                 TEXT,
            tags                    TEXT,
            original_language       TEXT,
            publication_demographic TEXT,
            content_rating          TEXT,
            description             TEXT,
            last_synced_at          TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (manga)");

    Ok(())
}
