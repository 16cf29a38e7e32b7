//! Metadata extraction from accepted catalog candidates
//!
//! Pure transformation of one MangaDex record into the flat payload merged
//! into the local manga row. Total over any syntactically valid candidate:
//! missing optional fields degrade to empty lists or None, never an error.

use chrono::Utc;

use super::mangadex_client::{MdManga, MdTag};
use crate::models::{AltTitle, MangaMetadata, TagSummary};

/// Extract the enrichment payload from an accepted candidate
///
/// The last-synced stamp is set to the current time on every extraction.
pub fn extract_metadata(manga: &MdManga) -> MangaMetadata {
    let attrs = &manga.attributes;

    MangaMetadata {
        mangadex_id: manga.id.clone(),
        alt_titles: extract_alt_titles(manga),
        authors: related_names(manga, "author"),
        artists: related_names(manga, "artist"),
        tags: attrs.tags.iter().map(tag_summary).collect(),
        original_language: attrs.original_language.clone(),
        publication_demographic: attrs.publication_demographic.clone(),
        content_rating: attrs.content_rating.clone(),
        description: extract_description(manga),
        synced_at: Utc::now(),
    }
}

/// Names of related entities of the given kind, falling back to the entity
/// id when the provider omitted a display name
fn related_names(manga: &MdManga, kind: &str) -> Vec<String> {
    manga
        .relationships
        .iter()
        .filter(|rel| rel.kind == kind)
        .map(|rel| {
            rel.attributes
                .as_ref()
                .and_then(|attrs| attrs.name.clone())
                .unwrap_or_else(|| rel.id.clone())
        })
        .collect()
}

/// Every alternate-title entry contributes exactly one (language, text) pair
fn extract_alt_titles(manga: &MdManga) -> Vec<AltTitle> {
    manga
        .attributes
        .alt_titles
        .iter()
        .filter_map(|entry| entry.iter().next())
        .map(|(lang, title)| AltTitle {
            lang: lang.clone(),
            title: title.clone(),
        })
        .collect()
}

/// Tag name prefers English, falls back to Japanese, then "Unknown"
fn tag_summary(tag: &MdTag) -> TagSummary {
    let name = tag
        .attributes
        .name
        .get("en")
        .or_else(|| tag.attributes.name.get("ja"))
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string());

    TagSummary {
        id: tag.id.clone(),
        name,
        group: tag.attributes.group.clone(),
    }
}

/// Description prefers English, falls back to Japanese, then the first
/// available language value (language-code order), else None
fn extract_description(manga: &MdManga) -> Option<String> {
    let description = &manga.attributes.description;
    description
        .get("en")
        .or_else(|| description.get("ja"))
        .or_else(|| description.values().next())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mangadex_client::{
        MdMangaAttributes, MdRelationship, MdRelationshipAttributes, MdTagAttributes,
    };
    use std::collections::BTreeMap;

    fn lang_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn one_piece() -> MdManga {
        MdManga {
            id: "md-one-piece".to_string(),
            attributes: MdMangaAttributes {
                title: lang_map(&[("en", "One Piece"), ("ja", "ワンピース")]),
                alt_titles: vec![
                    lang_map(&[("ja-ro", "Wan Pisu")]),
                    lang_map(&[("fr", "One Piece (FR)")]),
                ],
                description: lang_map(&[("en", "Pirates chase the One Piece.")]),
                original_language: Some("ja".to_string()),
                publication_demographic: Some("shounen".to_string()),
                content_rating: Some("safe".to_string()),
                tags: vec![MdTag {
                    id: "tag-action".to_string(),
                    attributes: MdTagAttributes {
                        name: lang_map(&[("en", "Action")]),
                        group: Some("genre".to_string()),
                    },
                }],
            },
            relationships: vec![
                MdRelationship {
                    id: "author-oda".to_string(),
                    kind: "author".to_string(),
                    attributes: Some(MdRelationshipAttributes {
                        name: Some("Eiichiro Oda".to_string()),
                    }),
                },
                MdRelationship {
                    id: "artist-oda".to_string(),
                    kind: "artist".to_string(),
                    attributes: Some(MdRelationshipAttributes {
                        name: Some("Eiichiro Oda".to_string()),
                    }),
                },
                MdRelationship {
                    id: "cover-1".to_string(),
                    kind: "cover_art".to_string(),
                    attributes: None,
                },
            ],
        }
    }

    #[test]
    fn test_extract_full_candidate() {
        let metadata = extract_metadata(&one_piece());

        assert_eq!(metadata.mangadex_id, "md-one-piece");
        assert_eq!(metadata.authors, vec!["Eiichiro Oda"]);
        assert_eq!(metadata.artists, vec!["Eiichiro Oda"]);
        assert_eq!(metadata.alt_titles.len(), 2);
        assert_eq!(metadata.alt_titles[0].lang, "ja-ro");
        assert_eq!(metadata.alt_titles[0].title, "Wan Pisu");
        assert_eq!(metadata.tags.len(), 1);
        assert_eq!(metadata.tags[0].name, "Action");
        assert_eq!(metadata.tags[0].group.as_deref(), Some("genre"));
        assert_eq!(
            metadata.description.as_deref(),
            Some("Pirates chase the One Piece.")
        );
        assert_eq!(metadata.original_language.as_deref(), Some("ja"));
        assert_eq!(metadata.publication_demographic.as_deref(), Some("shounen"));
        assert_eq!(metadata.content_rating.as_deref(), Some("safe"));
    }

    #[test]
    fn test_author_name_falls_back_to_entity_id() {
        let mut manga = one_piece();
        manga.relationships[0].attributes = None;

        let metadata = extract_metadata(&manga);
        assert_eq!(metadata.authors, vec!["author-oda"]);
    }

    #[test]
    fn test_tag_name_fallback_chain() {
        let mut manga = one_piece();
        manga.attributes.tags = vec![
            MdTag {
                id: "tag-ja-only".to_string(),
                attributes: MdTagAttributes {
                    name: lang_map(&[("ja", "アクション")]),
                    group: None,
                },
            },
            MdTag {
                id: "tag-nameless".to_string(),
                attributes: MdTagAttributes::default(),
            },
        ];

        let metadata = extract_metadata(&manga);
        assert_eq!(metadata.tags[0].name, "アクション");
        assert_eq!(metadata.tags[1].name, "Unknown");
    }

    #[test]
    fn test_description_language_fallbacks() {
        let mut manga = one_piece();

        manga.attributes.description = lang_map(&[("ja", "海賊")]);
        assert_eq!(extract_metadata(&manga).description.as_deref(), Some("海賊"));

        manga.attributes.description = lang_map(&[("pt-br", "Piratas"), ("ru", "Пираты")]);
        // First available in language-code order
        assert_eq!(
            extract_metadata(&manga).description.as_deref(),
            Some("Piratas")
        );

        manga.attributes.description = BTreeMap::new();
        assert_eq!(extract_metadata(&manga).description, None);
    }

    #[test]
    fn test_extract_bare_candidate_degrades() {
        let manga = MdManga {
            id: "md-bare".to_string(),
            attributes: MdMangaAttributes::default(),
            relationships: Vec::new(),
        };

        let metadata = extract_metadata(&manga);
        assert_eq!(metadata.mangadex_id, "md-bare");
        assert!(metadata.authors.is_empty());
        assert!(metadata.artists.is_empty());
        assert!(metadata.alt_titles.is_empty());
        assert!(metadata.tags.is_empty());
        assert!(metadata.description.is_none());
        assert!(metadata.original_language.is_none());
        assert!(metadata.publication_demographic.is_none());
        assert!(metadata.content_rating.is_none());
    }
}
