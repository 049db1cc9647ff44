use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::similarity::{SimilarityIndex, DEFAULT_NEIGHBORS};

/// Only the most recent seeds are expanded.
pub const MAX_SEEDS: usize = 5;

/// Upper bound on a personalized list.
pub const MAX_RECOMMENDATIONS: usize = 12;

/// Merges the neighbors of several seed titles into one list.
///
/// Candidates are collected seed by seed (earlier seeds win on overlap),
/// then shuffled and capped. Relative similarity across seeds is not kept.
pub struct RecommendationAggregator {
    index: Arc<SimilarityIndex>,
}

impl RecommendationAggregator {
    pub fn new(index: Arc<SimilarityIndex>) -> Self {
        Self { index }
    }

    pub fn personalize<S: AsRef<str>>(&self, seeds: &[S]) -> Vec<String> {
        self.personalize_with_rng(seeds, &mut rand::rng())
    }

    pub fn personalize_with_rng<S, R>(&self, seeds: &[S], rng: &mut R) -> Vec<String>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let seeds = recent_unique_seeds(seeds, MAX_SEEDS);

        let mut seen: HashSet<String> = seeds.iter().map(|s| s.to_lowercase()).collect();
        let mut candidates = vec![];

        for seed in &seeds {
            for title in self.index.neighbors(seed, DEFAULT_NEIGHBORS) {
                if seen.insert(title.to_lowercase()) {
                    candidates.push(title);
                }
            }
        }

        log::debug!(
            "personalize: {} seeds -> {} candidates",
            seeds.len(),
            candidates.len()
        );

        candidates.shuffle(rng);
        candidates.truncate(MAX_RECOMMENDATIONS);
        candidates
    }
}

/// Deduplicates seeds (case-insensitively) and keeps the last `limit`.
///
/// A repeated seed counts at the position of its latest occurrence, so the
/// result stays in supplied order with the newest interests last.
pub fn recent_unique_seeds<S: AsRef<str>>(seeds: &[S], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique: Vec<String> = seeds
        .iter()
        .rev()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect();

    unique.truncate(limit);
    unique.reverse();
    unique
}
