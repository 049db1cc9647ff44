//! Personalized recommendations built from seed titles.
//!
//! - `aggregator`: seeds -> shuffled, deduplicated candidate list
//! - `interests`: where seeds come from (session dwell, likes, saves)

mod aggregator;
mod interests;

pub use aggregator::{
    recent_unique_seeds, RecommendationAggregator, MAX_RECOMMENDATIONS, MAX_SEEDS,
};
pub use interests::{SeedSources, SessionInterests, DEFAULT_MIN_DWELL};
