//! Content-similarity lookups over the precomputed matrix.
//!
//! - `matrix`: square score matrix and its `similarity.bin` format
//! - `index`: title -> nearest titles

mod index;
mod matrix;

pub use index::{SimilarityIndex, DEFAULT_NEIGHBORS};
pub use matrix::{SimilarityError, SimilarityMatrix};
