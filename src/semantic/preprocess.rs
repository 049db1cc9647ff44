//! Text selection and truncation for embedding and retrieval.
//!
//! Movies carry several optional descriptive fields. Which one is used is
//! decided by a fixed priority list, never by ad-hoc checks at call sites.

use crate::catalog::Movie;

/// Maximum characters of descriptive text handed to the prompt
pub const INFO_MAX_CHARS: usize = 400;

/// Ellipsis suffix when content is truncated
const TRUNCATION_SUFFIX: &str = "...";

/// Shown when a movie has no descriptive field at all
const NO_INFO: &str = "No info available";

type FieldGetter = fn(&Movie) -> Option<&str>;

fn bag_of_words(movie: &Movie) -> Option<&str> {
    movie.bag_of_words.as_deref()
}

fn tags(movie: &Movie) -> Option<&str> {
    movie.tags.as_deref()
}

fn overview(movie: &Movie) -> Option<&str> {
    movie.overview.as_deref()
}

fn title(movie: &Movie) -> Option<&str> {
    Some(movie.title.as_str())
}

/// Retrieval info: bag of words, then tags, then overview.
const INFO_FIELDS: [FieldGetter; 3] = [bag_of_words, tags, overview];

/// Embedding input: bag of words, then tags, then title.
const SEARCH_FIELDS: [FieldGetter; 3] = [bag_of_words, tags, title];

/// First field that is present and not blank.
fn first_available<'a>(movie: &'a Movie, fields: &[FieldGetter]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| field(movie))
        .find(|value| !value.trim().is_empty())
}

/// Text the corpus embedding of `movie` is computed from.
pub fn search_text(movie: &Movie) -> String {
    first_available(movie, &SEARCH_FIELDS)
        .unwrap_or(movie.title.as_str())
        .to_string()
}

/// Richest description of `movie`, capped at `INFO_MAX_CHARS`.
pub fn describe(movie: &Movie) -> String {
    let info = first_available(movie, &INFO_FIELDS).unwrap_or(NO_INFO);
    truncate_info(info)
}

/// Keeps the first `INFO_MAX_CHARS` characters and appends "..." when
/// anything was cut.
pub fn truncate_info(info: &str) -> String {
    match info.char_indices().nth(INFO_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &info[..cut], TRUNCATION_SUFFIX),
        None => info.to_string(),
    }
}

/// Hash of the embedded text, used to tell stale cache entries apart.
pub fn content_hash(text: &str) -> u64 {
    use std::hash::{Hash, Hasher};

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.trim().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie() -> Movie {
        Movie {
            id: 1,
            title: "Interstellar".to_string(),
            overview: Some("A team travels through a wormhole".to_string()),
            tags: Some("space wormhole".to_string()),
            bag_of_words: Some("wormhole space mcconaughey sci-fi".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_describe_prefers_bag_of_words() {
        assert_eq!(describe(&movie()), "wormhole space mcconaughey sci-fi");
    }

    #[test]
    fn test_describe_falls_back_in_order() {
        let mut m = movie();
        m.bag_of_words = None;
        assert_eq!(describe(&m), "space wormhole");

        m.tags = Some("   ".to_string());
        assert_eq!(describe(&m), "A team travels through a wormhole");

        m.overview = None;
        assert_eq!(describe(&m), NO_INFO);
    }

    #[test]
    fn test_search_text_falls_back_to_title() {
        let mut m = movie();
        assert_eq!(search_text(&m), "wormhole space mcconaughey sci-fi");

        m.bag_of_words = None;
        m.tags = None;
        assert_eq!(search_text(&m), "Interstellar");
    }

    #[test]
    fn test_truncation_law() {
        let long = "x".repeat(1000);
        let info = truncate_info(&long);

        assert_eq!(info.chars().count(), INFO_MAX_CHARS + TRUNCATION_SUFFIX.len());
        assert!(info.ends_with(TRUNCATION_SUFFIX));
        assert!(long.starts_with(&info[..INFO_MAX_CHARS]));
    }

    #[test]
    fn test_no_truncation_at_limit() {
        let exact = "y".repeat(INFO_MAX_CHARS);
        assert_eq!(truncate_info(&exact), exact);
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let long = "é".repeat(INFO_MAX_CHARS + 1);
        let info = truncate_info(&long);
        assert_eq!(info.chars().count(), INFO_MAX_CHARS + 3);
    }

    #[test]
    fn test_content_hash_trims() {
        assert_eq!(content_hash("  space  "), content_hash("space"));
        assert_ne!(content_hash("space"), content_hash("romance"));
    }
}
