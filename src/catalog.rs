//! Movie catalog loaded once from `movies.csv`.
//!
//! Rows keep their file order; the row position is what the similarity
//! matrix and the corpus embeddings are aligned on.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog is empty")]
    Empty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    #[serde(rename = "movie_id")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    /// Overview, genres and cast folded into one field.
    #[serde(default)]
    pub bag_of_words: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub trending: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub all_time_fav: bool,
}

/// Flags come out of a dataframe export, so "1", "1.0", "0.0", "true" and
/// empty cells all show up.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(false);
    };

    let raw = raw.trim().to_lowercase();
    if raw == "true" {
        return Ok(true);
    }

    Ok(raw.parse::<f64>().map(|v| v > 0.0).unwrap_or(false))
}

/// Compact reference used by feeds and the web api.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRef {
    pub title: String,
    pub id: u64,
}

impl From<&Movie> for MovieRef {
    fn from(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            id: movie.id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
    /// lowercased title -> first row with that title
    by_title: HashMap<String, usize>,
}

impl Catalog {
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        let mut by_title = HashMap::with_capacity(movies.len());
        for (row, movie) in movies.iter().enumerate() {
            by_title.entry(movie.title.to_lowercase()).or_insert(row);
        }

        Self { movies, by_title }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let now = Instant::now();
        let mut reader = csv::Reader::from_path(path)?;

        let mut movies = vec![];
        for record in reader.deserialize::<Movie>() {
            movies.push(record?);
        }

        if movies.is_empty() {
            return Err(CatalogError::Empty);
        }

        log::debug!(
            "took {}ms to read catalog",
            now.elapsed().as_micros() as f64 / 1000.0
        );
        log::info!("loaded {} movies from {}", movies.len(), path.display());

        Ok(Self::from_movies(movies))
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Movie> {
        self.movies.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.iter()
    }

    /// Row of the movie whose title matches case-insensitively.
    pub fn position(&self, title: &str) -> Option<usize> {
        self.by_title.get(&title.to_lowercase()).copied()
    }

    pub fn find(&self, title: &str) -> Option<&Movie> {
        self.position(title).and_then(|row| self.movies.get(row))
    }

    /// Every title capitalized for autocomplete.
    pub fn suggestions(&self) -> Vec<String> {
        self.movies.iter().map(|m| capitalize(&m.title)).collect()
    }

    pub fn trending(&self, limit: usize) -> Vec<&Movie> {
        self.movies.iter().filter(|m| m.trending).take(limit).collect()
    }

    pub fn classics(&self, limit: usize) -> Vec<&Movie> {
        self.movies
            .iter()
            .filter(|m| m.all_time_fav)
            .take(limit)
            .collect()
    }
}

/// First character uppercased, the rest lowercased.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
