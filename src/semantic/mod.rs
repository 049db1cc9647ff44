//! Semantic retrieval over movie descriptions.
//!
//! This module provides local semantic search using fastembed-rs for
//! generating embeddings and an in-memory corpus for similarity search.
//!
//! # Architecture
//!
//! - `embeddings`: Wraps fastembed behind the `Embedder` trait
//! - `index`: Row-aligned corpus index with cosine similarity search
//! - `storage`: Binary file I/O for the vectors.bin cache
//! - `preprocess`: Field selection and truncation of movie text
//! - `retriever`: Query -> top-k movies with prompt-ready info

mod embeddings;
mod index;
mod preprocess;
mod retriever;
mod storage;

pub use embeddings::{Embedder, EmbeddingError, EmbeddingModel};
pub use preprocess::INFO_MAX_CHARS;
pub use retriever::{RetrievalError, Retrieved, SemanticRetriever, DEFAULT_TOP_K};
pub use storage::VectorStorage;

/// Default embedding model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
