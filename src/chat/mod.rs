//! Free-text movie chat.
//!
//! - `context`: retrieved movies -> prompt context block
//! - `generator`: prompt template, decoding params, output clean-up
//! - `llama`: HTTP client for a llama.cpp completion server
//! - `service`: retrieval + generation with graceful fallbacks

mod context;
mod generator;
mod llama;
mod service;

pub use generator::{
    GenerationError, GenerationParams, ResponseGenerator, TextGenerator, DEFAULT_STOP,
    FALLBACK_PREFIX,
};
pub use llama::LlamaCppClient;
pub use service::{ChatService, BUSY_REPLY, NO_MATCHES_REPLY};
