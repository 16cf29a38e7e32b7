//! Title matching for catalog candidates
//!
//! Word-set Jaccard similarity over normalized titles. Word overlap tolerates
//! reordering, missing subtitles, and punctuation differences better than
//! exact or edit-distance comparison for manga titles, which commonly have
//! reordered multilingual variants.

use std::collections::HashSet;

use super::mangadex_client::MdManga;

/// Minimum similarity for an automatic match. A wrong automatic merge
/// corrupts metadata silently, so recall is traded for precision.
pub const MATCH_THRESHOLD: f64 = 0.6;

/// The accepted candidate and the score that cleared the threshold
#[derive(Debug, Clone, Copy)]
pub struct BestMatch<'a> {
    pub candidate: &'a MdManga,
    pub score: f64,
}

/// Normalize a title into a canonical comparison key
///
/// Lowercase, strip every character that is not a lowercase letter, digit,
/// or whitespace, collapse whitespace runs, trim. Deterministic and total;
/// the output is only ever compared, never displayed.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokenize a normalized title into its word set
///
/// Tokens of length ≤ 1 are noise and excluded to avoid spurious matches on
/// short connector words.
fn title_tokens(normalized: &str) -> HashSet<&str> {
    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .collect()
}

/// Jaccard similarity between two normalized titles, in [0, 1]
///
/// Returns 0.0 when either side has no usable tokens.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = title_tokens(a);
    let tokens_b = title_tokens(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f64 / union as f64
}

/// Every title string of a candidate worth comparing: the primary English,
/// Japanese, and romanized-Japanese titles plus every alternate title
fn candidate_titles(manga: &MdManga) -> impl Iterator<Item = &str> {
    let attrs = &manga.attributes;
    ["en", "ja", "ja-ro"]
        .into_iter()
        .filter_map(|lang| attrs.title.get(lang).map(String::as_str))
        .chain(
            attrs
                .alt_titles
                .iter()
                .flat_map(|entry| entry.values().map(String::as_str)),
        )
}

/// Select the best-matching candidate for a local title, if any clears the
/// acceptance threshold
///
/// Tracks the single highest score across all candidates and all their
/// titles. Ties keep the first-seen candidate in provider-ranked order (the
/// comparison is strictly greater-than), preserving the upstream behavior.
pub fn best_match<'a>(local_title: &str, candidates: &'a [MdManga]) -> Option<BestMatch<'a>> {
    let normalized_local = normalize_title(local_title);

    let mut best: Option<BestMatch<'a>> = None;

    for candidate in candidates {
        for title in candidate_titles(candidate) {
            let score = title_similarity(&normalized_local, &normalize_title(title));
            if best.map(|b| score > b.score).unwrap_or(true) {
                best = Some(BestMatch { candidate, score });
            }
        }
    }

    match best {
        Some(b) if b.score >= MATCH_THRESHOLD => {
            tracing::debug!(
                local_title = %local_title,
                mangadex_id = %b.candidate.id,
                score = b.score,
                "Accepted catalog match"
            );
            Some(b)
        }
        Some(b) => {
            tracing::debug!(
                local_title = %local_title,
                best_score = b.score,
                "Best candidate below match threshold"
            );
            None
        }
        None => None,
    }
}
