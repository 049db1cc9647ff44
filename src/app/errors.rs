use crate::catalog::CatalogError;
use crate::chat::GenerationError;
use crate::semantic::{EmbeddingError, RetrievalError};
use crate::similarity::SimilarityError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("similarity error: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
