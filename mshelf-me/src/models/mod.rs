//! Data models for mshelf-me

pub mod enrichment;

pub use enrichment::{
    AltTitle, BatchItemResult, BatchReport, EnrichmentOutcome, EnrichmentStats, MangaMetadata,
    MatchSummary, TagSummary,
};
