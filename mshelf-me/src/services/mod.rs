//! Service layer for mshelf-me

pub mod enricher;
pub mod mangadex_client;
pub mod metadata_extractor;
pub mod title_matcher;

pub use enricher::Enricher;
pub use mangadex_client::{CatalogSearch, MangaDexClient};
