//! Prompted reply generation.
//!
//! The backend is a single stateful model, so every call goes through one
//! mutex. Output is cut down to one line whatever the backend returns.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Prefix of the reply used when no model output is available.
pub const FALLBACK_PREFIX: &str = "I found these movies: ";

/// Prompt section markers; generation stops before the model invents a new
/// turn.
pub const DEFAULT_STOP: [&str; 5] = ["Instruct:", "Output:", "User:", "\nUser", "Question:"];

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation model is not loaded")]
    Unavailable,

    #[error("generation timed out")]
    Timeout,

    #[error("generation backend error: {0}")]
    Backend(String),

    #[error("generation lock poisoned: {0}")]
    Poisoned(String),
}

/// Decoding constraints passed to every completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: usize,
    pub temperature: f32,
    pub repeat_penalty: f32,
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.6,
            repeat_penalty: 1.1,
            stop: DEFAULT_STOP.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Raw text completion primitive.
pub trait TextGenerator: Send {
    fn name(&self) -> &str;

    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError>;
}

pub struct ResponseGenerator {
    backend: Option<Mutex<Box<dyn TextGenerator>>>,
    params: GenerationParams,
}

impl ResponseGenerator {
    pub fn new(backend: Option<Box<dyn TextGenerator>>, params: GenerationParams) -> Self {
        if backend.is_none() {
            log::warn!("no generation model configured, chat replies will list retrieved movies");
        }

        Self {
            backend: backend.map(Mutex::new),
            params,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// One-line answer to `query` grounded on `context`.
    ///
    /// Fails with `Unavailable` when no backend is configured; the reply
    /// built from the context is the caller's choice.
    pub fn generate(&self, query: &str, context: &str) -> Result<String, GenerationError> {
        let Some(backend) = &self.backend else {
            return Err(GenerationError::Unavailable);
        };

        let prompt = build_prompt(query, context);

        let raw = {
            let backend = backend
                .lock()
                .map_err(|e| GenerationError::Poisoned(e.to_string()))?;
            log::debug!("generating with {}", backend.name());
            backend.complete(&prompt, &self.params)?
        };

        Ok(post_process(&raw, self.params.max_tokens))
    }
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "Instruct: You are Max, a movie recommender.
Context: {context}
User: {query}

Task: Recommend a movie from the Context.
Rules:
1. Keep it under 50 words.
2. Do NOT make up puzzles or stories.
3. Stop speaking immediately after your recommendation.

Output:"
    )
}

/// Trims, keeps the first line and caps the word count at `max_tokens`.
pub fn post_process(raw: &str, max_tokens: usize) -> String {
    let text = raw.trim();
    let line = text.split('\n').next().unwrap_or_default().trim_end();

    if line.split_whitespace().count() <= max_tokens {
        return line.to_string();
    }

    line.split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reply used when generation is unavailable or failed.
pub fn fallback_reply(context: &str) -> String {
    format!("{FALLBACK_PREFIX}{context}")
}
