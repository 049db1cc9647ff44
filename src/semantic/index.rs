//! In-memory corpus index with cosine similarity search.
//!
//! Entries are aligned with catalog rows: entry `i` is the embedding of
//! movie `i`.

/// An entry in the corpus index.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// Hash of the text that was embedded
    pub content_hash: u64,
    /// The embedding vector
    pub embedding: Vec<f32>,
}

/// Dense corpus of movie embeddings, immutable once built.
pub struct CorpusIndex {
    entries: Vec<VectorEntry>,
    dimensions: usize,
}

/// Search result from the corpus index.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Catalog row
    pub row: usize,
    /// Cosine similarity score
    pub score: f32,
}

impl CorpusIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimensions,
        }
    }

    pub fn with_capacity(dimensions: usize, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            dimensions,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends the embedding for the next catalog row.
    pub fn push(&mut self, content_hash: u64, embedding: Vec<f32>) -> Result<(), IndexError> {
        if embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: embedding.len(),
            });
        }

        self.entries.push(VectorEntry {
            content_hash,
            embedding,
        });

        Ok(())
    }

    pub fn get(&self, row: usize) -> Option<&VectorEntry> {
        self.entries.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &VectorEntry)> {
        self.entries.iter().enumerate()
    }

    /// The `limit` rows most similar to `query`, highest score first.
    ///
    /// No threshold is applied. Equal scores keep row order. A zero-norm
    /// vector scores 0.0 against everything.
    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchResult>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        let query_norm = Self::l2_norm(query);

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .enumerate()
            .map(|(row, entry)| SearchResult {
                row,
                score: Self::cosine_similarity(query, &entry.embedding, query_norm),
            })
            .collect();

        // Stable sort, ties stay in row order
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    fn l2_norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Cosine similarity with a precomputed query norm.
    fn cosine_similarity(query: &[f32], target: &[f32], query_norm: f32) -> f32 {
        let target_norm = Self::l2_norm(target);
        if query_norm < f32::EPSILON || target_norm < f32::EPSILON {
            return 0.0;
        }

        let dot_product: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
        dot_product / (query_norm * target_norm)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
