//! Free-text retrieval over the movie corpus.
//!
//! The corpus is embedded once when the retriever is built and is read-only
//! afterwards. Building reuses cached vectors whose text did not change.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::semantic::embeddings::{Embedder, EmbeddingError};
use crate::semantic::index::{CorpusIndex, IndexError};
use crate::semantic::preprocess::{content_hash, describe, search_text};
use crate::semantic::storage::{VectorStorage, VectorStorageError};

/// Number of movies retrieved per query by default.
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Storage error: {0}")]
    Storage(#[from] VectorStorageError),

    #[error("Embedder returned {got} vectors for {expected} texts")]
    IncompleteBatch { expected: usize, got: usize },
}

/// One retrieved movie with the text handed to the prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Retrieved {
    pub title: String,
    pub info: String,
    pub score: f32,
}

pub struct SemanticRetriever {
    catalog: Arc<Catalog>,
    embedder: Arc<dyn Embedder>,
    index: CorpusIndex,
}

impl SemanticRetriever {
    /// Embeds the whole catalog.
    ///
    /// With `storage`, vectors whose text hash still matches are reused and
    /// the refreshed corpus is written back.
    pub fn build(
        catalog: Arc<Catalog>,
        embedder: Arc<dyn Embedder>,
        storage: Option<&VectorStorage>,
    ) -> Result<Self, RetrievalError> {
        let now = Instant::now();
        let dimensions = embedder.dimensions();
        let model_id = embedder.model_id_hash();

        let mut cached = match storage.filter(|s| s.exists()) {
            Some(storage) => match storage.load(&model_id, dimensions) {
                Ok(entries) => {
                    log::info!("loaded {} cached vectors", entries.len());
                    entries
                }
                Err(err) => {
                    log::warn!("discarding vectors cache: {err}");
                    Default::default()
                }
            },
            None => Default::default(),
        };

        let texts: Vec<String> = catalog.iter().map(search_text).collect();
        let hashes: Vec<u64> = texts.iter().map(|t| content_hash(t)).collect();

        let mut vectors: Vec<Option<Vec<f32>>> = hashes
            .iter()
            .enumerate()
            .map(|(row, hash)| {
                cached
                    .remove(&row)
                    .filter(|entry| entry.content_hash == *hash)
                    .map(|entry| entry.embedding)
            })
            .collect();

        let missing: Vec<usize> = (0..vectors.len()).filter(|&row| vectors[row].is_none()).collect();
        if !missing.is_empty() {
            log::info!("embedding {} of {} movies", missing.len(), texts.len());

            let batch: Vec<String> = missing.iter().map(|&row| texts[row].clone()).collect();
            let embedded = embedder.embed_batch(&batch)?;
            if embedded.len() != batch.len() {
                return Err(RetrievalError::IncompleteBatch {
                    expected: batch.len(),
                    got: embedded.len(),
                });
            }

            for (row, embedding) in missing.iter().zip(embedded) {
                vectors[*row] = Some(embedding);
            }
        }

        let mut index = CorpusIndex::with_capacity(dimensions, vectors.len());
        for (vector, hash) in vectors.into_iter().zip(hashes) {
            index.push(hash, vector.unwrap_or_else(|| vec![0.0; dimensions]))?;
        }

        if let Some(storage) = storage {
            if !missing.is_empty() || !storage.exists() {
                storage.save(&index, &model_id)?;
            }
        }

        log::debug!(
            "took {}ms to build corpus index",
            now.elapsed().as_micros() as f64 / 1000.0
        );

        Ok(Self {
            catalog,
            embedder,
            index,
        })
    }

    pub fn corpus_size(&self) -> usize {
        self.index.len()
    }

    /// The `top_k` movies closest to `query`, best first.
    ///
    /// Only an empty corpus produces an empty list; weak matches are still
    /// returned.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Retrieved>, RetrievalError> {
        if self.index.is_empty() || top_k == 0 {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query)?;
        let results = self.index.search(&query_embedding, top_k)?;

        Ok(results
            .into_iter()
            .filter_map(|result| {
                self.catalog.get(result.row).map(|movie| Retrieved {
                    title: movie.title.clone(),
                    info: describe(movie),
                    score: result.score,
                })
            })
            .collect())
    }
}
