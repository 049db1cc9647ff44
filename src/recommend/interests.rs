use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default dwell time after which a viewed title counts as an interest.
pub const DEFAULT_MIN_DWELL: Duration = Duration::from_secs(15);

/// Titles the viewer lingered on during the current session, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SessionInterests(Vec<String>);

impl SessionInterests {
    pub fn new(titles: Vec<String>) -> Self {
        Self(titles)
    }

    /// Records `title` when the viewer stayed strictly longer than
    /// `min_dwell`. Returns whether the title was added.
    pub fn record(&mut self, title: &str, dwell: Duration, min_dwell: Duration) -> bool {
        if dwell <= min_dwell || title.trim().is_empty() {
            return false;
        }
        if self.0.iter().any(|t| t == title) {
            return false;
        }

        self.0.push(title.to_string());
        true
    }

    pub fn titles(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Everything that can seed personalization for one viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedSources {
    #[serde(default)]
    pub interests: SessionInterests,
    #[serde(default)]
    pub liked: Vec<String>,
    #[serde(default)]
    pub saved: Vec<String>,
}

impl SeedSources {
    /// Session interests, then likes, then saves. Later entries count as
    /// more recent.
    pub fn seeds(&self) -> Vec<String> {
        self.interests
            .titles()
            .iter()
            .chain(self.liked.iter())
            .chain(self.saved.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_requires_dwell_above_threshold() {
        let mut interests = SessionInterests::default();

        assert!(!interests.record("Heat", Duration::from_secs(15), DEFAULT_MIN_DWELL));
        assert!(interests.titles().is_empty());

        assert!(interests.record("Heat", Duration::from_secs(16), DEFAULT_MIN_DWELL));
        assert_eq!(interests.titles(), &["Heat".to_string()]);
    }

    #[test]
    fn test_record_ignores_duplicates() {
        let mut interests = SessionInterests::new(vec!["Heat".to_string()]);
        assert!(!interests.record("Heat", Duration::from_secs(60), DEFAULT_MIN_DWELL));
        assert_eq!(interests.titles().len(), 1);
    }

    #[test]
    fn test_seed_order() {
        let sources = SeedSources {
            interests: SessionInterests::new(vec!["A".to_string()]),
            liked: vec!["B".to_string()],
            saved: vec!["C".to_string(), "A".to_string()],
        };
        assert_eq!(sources.seeds(), vec!["A", "B", "C", "A"]);
    }
}
