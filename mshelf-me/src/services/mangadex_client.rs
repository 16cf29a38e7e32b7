//! MangaDex API client
//!
//! Title search against the MangaDex catalog with rate limiting. Response
//! shapes are modeled with optional fields throughout: the API omits
//! attributes freely and extraction must degrade rather than fail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const MANGADEX_BASE_URL: &str = "https://api.mangadex.org";
const RATE_LIMIT_MS: u64 = 250; // 5 requests per second (published limit)
const SEARCH_RESULT_LIMIT: u32 = 10;

/// MangaDex client errors
#[derive(Debug, Error)]
pub enum MangaDexError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// MangaDex search response envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MdSearchResponse {
    pub result: String,
    #[serde(default)]
    pub data: Vec<MdManga>,
}

/// One manga candidate from the catalog
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MdManga {
    /// MangaDex manga id (uuid string)
    pub id: String,
    pub attributes: MdMangaAttributes,
    /// Related entities (authors, artists, cover art) when requested inline
    #[serde(default)]
    pub relationships: Vec<MdRelationship>,
}

/// Manga attributes (multilingual maps keyed by language code)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MdMangaAttributes {
    /// Primary title per language ("en", "ja", "ja-ro", ...)
    #[serde(default)]
    pub title: BTreeMap<String, String>,
    /// Alternate titles; each entry is a single-key language → text map
    #[serde(default)]
    pub alt_titles: Vec<BTreeMap<String, String>>,
    /// Long-form description per language
    #[serde(default)]
    pub description: BTreeMap<String, String>,
    pub original_language: Option<String>,
    pub publication_demographic: Option<String>,
    pub content_rating: Option<String>,
    #[serde(default)]
    pub tags: Vec<MdTag>,
}

/// Tag relation on a manga
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MdTag {
    pub id: String,
    #[serde(default)]
    pub attributes: MdTagAttributes,
}

/// Tag attributes (localized name + group classification)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MdTagAttributes {
    #[serde(default)]
    pub name: BTreeMap<String, String>,
    pub group: Option<String>,
}

/// Relationship to another entity (author, artist, cover_art)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MdRelationship {
    pub id: String,
    /// Relationship type ("author", "artist", "cover_art")
    #[serde(rename = "type")]
    pub kind: String,
    /// Inline attributes, present only when the search requested includes
    pub attributes: Option<MdRelationshipAttributes>,
}

/// Inline relationship attributes
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MdRelationshipAttributes {
    pub name: Option<String>,
}

/// Catalog search seam
///
/// The enrichment driver takes its catalog as an explicit dependency so tests
/// can substitute a stub for the network.
pub trait CatalogSearch {
    /// Search the catalog by raw (non-normalized) title, provider-ranked,
    /// capped at the search result limit
    fn search_title(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Vec<MdManga>, MangaDexError>> + Send;
}

/// Rate limiter enforcing 5 requests/second
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("MangaDex rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// MangaDex API client
pub struct MangaDexClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    base_url: String,
}

impl MangaDexClient {
    /// Create a client identified by `user_agent` (MangaDex requires a
    /// client identification header)
    pub fn new(user_agent: String) -> Result<Self, MangaDexError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MangaDexError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
            base_url: MANGADEX_BASE_URL.to_string(),
        })
    }
}

impl CatalogSearch for MangaDexClient {
    /// Search manga by title
    ///
    /// Requests author/artist/cover data inline, ordered by the provider's
    /// relevance ranking, capped at 10 results.
    async fn search_title(&self, title: &str) -> Result<Vec<MdManga>, MangaDexError> {
        // Rate limit
        self.rate_limiter.wait().await;

        let url = format!("{}/manga", self.base_url);
        let limit = SEARCH_RESULT_LIMIT.to_string();

        tracing::debug!(title = %title, "Querying MangaDex search API");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("title", title),
                ("limit", limit.as_str()),
                ("includes[]", "author"),
                ("includes[]", "artist"),
                ("includes[]", "cover_art"),
                ("order[relevance]", "desc"),
            ])
            .send()
            .await
            .map_err(|e| MangaDexError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 429 {
            return Err(MangaDexError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MangaDexError::ApiError(status.as_u16(), error_text));
        }

        let search_response: MdSearchResponse = response
            .json()
            .await
            .map_err(|e| MangaDexError::ParseError(e.to_string()))?;

        tracing::info!(
            title = %title,
            candidates = search_response.data.len(),
            "MangaDex search complete"
        );

        Ok(search_response.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(250);
        assert_eq!(limiter.min_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_client_creation() {
        let client = MangaDexClient::new("mshelf-test/0.1".to_string());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter_stays_under_5_per_second() {
        let limiter = RateLimiter::new(250);

        let start = Instant::now();

        // Make 3 requests
        for _ in 0..3 {
            limiter.wait().await;
        }

        let elapsed = start.elapsed();

        // Should take at least ~500ms (2 waits * 250ms)
        assert!(elapsed >= Duration::from_millis(450));
    }

    #[test]
    fn test_deserialize_search_response() {
        let body = r#"{
            "result": "ok",
            "data": [{
                "id": "a1c7c817-4e59-43b7-9365-09675a149a6f",
                "attributes": {
                    "title": {"en": "One Piece", "ja": "ワンピース"},
                    "altTitles": [{"ja-ro": "Wan Pisu"}],
                    "description": {"en": "Pirates."},
                    "originalLanguage": "ja",
                    "publicationDemographic": "shounen",
                    "contentRating": "safe",
                    "tags": [{
                        "id": "tag-1",
                        "attributes": {"name": {"en": "Action"}, "group": "genre"}
                    }]
                },
                "relationships": [
                    {"id": "author-1", "type": "author", "attributes": {"name": "Eiichiro Oda"}},
                    {"id": "cover-1", "type": "cover_art"}
                ]
            }]
        }"#;

        let response: MdSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.result, "ok");
        assert_eq!(response.data.len(), 1);

        let manga = &response.data[0];
        assert_eq!(manga.attributes.title.get("en").unwrap(), "One Piece");
        assert_eq!(manga.attributes.alt_titles.len(), 1);
        assert_eq!(manga.attributes.original_language.as_deref(), Some("ja"));
        assert_eq!(manga.attributes.tags[0].attributes.group.as_deref(), Some("genre"));
        assert_eq!(manga.relationships[0].kind, "author");
        assert!(manga.relationships[1].attributes.is_none());
    }

    #[test]
    fn test_deserialize_minimal_candidate() {
        // Sparse records must parse; optional fields degrade to defaults
        let body = r#"{
            "result": "ok",
            "data": [{"id": "bare", "attributes": {}}]
        }"#;

        let response: MdSearchResponse = serde_json::from_str(body).unwrap();
        let manga = &response.data[0];
        assert!(manga.attributes.title.is_empty());
        assert!(manga.attributes.alt_titles.is_empty());
        assert!(manga.attributes.description.is_empty());
        assert!(manga.attributes.content_rating.is_none());
        assert!(manga.relationships.is_empty());
    }
}
