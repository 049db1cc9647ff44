use std::sync::Arc;

use crate::catalog::Catalog;
use crate::similarity::matrix::{SimilarityError, SimilarityMatrix};

/// Default number of neighbors returned for a title.
pub const DEFAULT_NEIGHBORS: usize = 10;

/// Answers "which movies are most similar to this one" from the
/// precomputed matrix. Read-only after construction.
pub struct SimilarityIndex {
    catalog: Arc<Catalog>,
    matrix: SimilarityMatrix,
}

impl SimilarityIndex {
    /// Fails when the matrix is not aligned with the catalog rows.
    pub fn new(catalog: Arc<Catalog>, matrix: SimilarityMatrix) -> Result<Self, SimilarityError> {
        if matrix.len() != catalog.len() {
            return Err(SimilarityError::CatalogMismatch {
                expected: catalog.len(),
                got: matrix.len(),
            });
        }

        Ok(Self { catalog, matrix })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Up to `n` titles most similar to `title`, best first.
    ///
    /// Unknown titles yield an empty list. Ties keep catalog order.
    pub fn neighbors(&self, title: &str, n: usize) -> Vec<String> {
        self.neighbors_with_scores(title, n)
            .into_iter()
            .map(|(title, _)| title)
            .collect()
    }

    pub fn neighbors_with_scores(&self, title: &str, n: usize) -> Vec<(String, f32)> {
        let Some(row) = self.catalog.position(title) else {
            log::debug!("no similarity row for {title:?}");
            return vec![];
        };
        let Some(scores) = self.matrix.row(row) else {
            return vec![];
        };

        let mut order: Vec<usize> = (0..scores.len()).collect();
        // sort_by is stable, equal scores stay in catalog order
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // The self slot is the first position unless another row outscores
        // or ties ahead of it; either way it is dropped by row, never by score.
        let self_slot = order.iter().position(|&j| j == row).unwrap_or(0);
        order.remove(self_slot);

        order
            .into_iter()
            .take(n)
            .filter_map(|j| {
                self.catalog
                    .get(j)
                    .map(|movie| (movie.title.clone(), scores[j]))
            })
            .collect()
    }
}
