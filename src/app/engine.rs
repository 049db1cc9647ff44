use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, MovieRef};
use crate::chat::ChatService;
use crate::recommend::{RecommendationAggregator, SeedSources, SessionInterests};
use crate::similarity::SimilarityIndex;

/// Rows shown for trending and classic movies.
const FEED_ROW_LIMIT: usize = 15;

const WELCOME_HERO_ID: u64 = 550;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hero {
    pub title: String,
    pub overview: String,
    pub id: u64,
}

impl Default for Hero {
    fn default() -> Self {
        Self {
            title: "Welcome".to_string(),
            overview: String::new(),
            id: WELCOME_HERO_ID,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeFeed {
    pub hero: Hero,
    pub trending: Vec<MovieRef>,
    pub classics: Vec<MovieRef>,
    pub recommendations: Vec<MovieRef>,
}

/// Similarity lookups and personalization over the loaded catalog.
pub struct Recommender {
    index: Arc<SimilarityIndex>,
    aggregator: RecommendationAggregator,
}

impl Recommender {
    pub fn new(index: Arc<SimilarityIndex>) -> Self {
        Self {
            aggregator: RecommendationAggregator::new(index.clone()),
            index,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.index.catalog()
    }

    pub fn similar_titles(&self, title: &str, n: usize) -> Vec<String> {
        self.index.neighbors(title, n)
    }

    pub fn personalize<S: AsRef<str>>(&self, seeds: &[S]) -> Vec<String> {
        self.aggregator.personalize(seeds)
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.catalog().suggestions()
    }

    pub fn home_feed(&self, sources: &SeedSources) -> HomeFeed {
        self.home_feed_with_rng(sources, &mut rand::rng())
    }

    pub fn home_feed_with_rng<R: Rng + ?Sized>(&self, sources: &SeedSources, rng: &mut R) -> HomeFeed {
        let catalog = self.catalog();

        let hero = catalog
            .trending(1)
            .first()
            .map(|movie| Hero {
                title: movie.title.clone(),
                overview: movie.overview.clone().unwrap_or_default(),
                id: movie.id,
            })
            .unwrap_or_default();

        let trending = catalog
            .trending(FEED_ROW_LIMIT)
            .into_iter()
            .map(MovieRef::from)
            .collect();
        let classics = catalog
            .classics(FEED_ROW_LIMIT)
            .into_iter()
            .map(MovieRef::from)
            .collect();

        let recommendations = self
            .aggregator
            .personalize_with_rng(&sources.seeds(), rng)
            .iter()
            .filter_map(|title| catalog.find(title))
            .map(MovieRef::from)
            .collect();

        HomeFeed {
            hero,
            trending,
            classics,
            recommendations,
        }
    }
}

/// Process-wide service object handed to every request handler.
///
/// Everything inside is read-only after construction, except the
/// generation backend which serializes itself.
pub struct Engine {
    pub recommender: Recommender,
    pub chat: ChatService,
    min_dwell: Duration,
}

impl Engine {
    pub fn new(recommender: Recommender, chat: ChatService, min_dwell: Duration) -> Self {
        Self {
            recommender,
            chat,
            min_dwell,
        }
    }

    pub fn similar_titles(&self, title: &str, n: usize) -> Vec<String> {
        self.recommender.similar_titles(title, n)
    }

    pub fn personalize<S: AsRef<str>>(&self, seeds: &[S]) -> Vec<String> {
        self.recommender.personalize(seeds)
    }

    pub fn retrieve_and_answer(&self, query: &str) -> String {
        self.chat.retrieve_and_answer(query)
    }

    pub fn record_interaction(
        &self,
        interests: &mut SessionInterests,
        title: &str,
        dwell: Duration,
    ) -> bool {
        interests.record(title, dwell, self.min_dwell)
    }
}
