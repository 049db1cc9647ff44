use std::time::Instant;

use crate::chat::context::compose;
use crate::chat::generator::{fallback_reply, GenerationError, ResponseGenerator};
use crate::semantic::SemanticRetriever;

/// Reply when the corpus has nothing to offer.
pub const NO_MATCHES_REPLY: &str = "I couldn't find any movies like that in our database.";

/// Reply when the request failed before any context existed.
pub const BUSY_REPLY: &str = "I'm thinking too hard... try again!";

/// Retrieval plus generation behind one call that always yields text.
pub struct ChatService {
    retriever: SemanticRetriever,
    generator: ResponseGenerator,
    top_k: usize,
}

impl ChatService {
    pub fn new(retriever: SemanticRetriever, generator: ResponseGenerator, top_k: usize) -> Self {
        Self {
            retriever,
            generator,
            top_k,
        }
    }

    pub fn retriever(&self) -> &SemanticRetriever {
        &self.retriever
    }

    pub fn retrieve_and_answer(&self, query: &str) -> String {
        let now = Instant::now();

        let retrieved = match self.retriever.retrieve(query, self.top_k) {
            Ok(retrieved) => retrieved,
            Err(err) => {
                log::error!("chat retrieval failed: {err}");
                return BUSY_REPLY.to_string();
            }
        };

        if retrieved.is_empty() {
            return NO_MATCHES_REPLY.to_string();
        }

        let context = compose(&retrieved);
        log::debug!("chat context:\n{context}");

        let reply = match self.generator.generate(query, &context) {
            Ok(reply) => reply,
            Err(GenerationError::Unavailable) => {
                log::info!("generation unavailable, answering with context");
                fallback_reply(&context)
            }
            Err(GenerationError::Timeout) => {
                log::warn!("generation timed out, answering with context");
                fallback_reply(&context)
            }
            Err(err) => {
                log::error!("generation failed: {err}");
                fallback_reply(&context)
            }
        };

        log::info!(
            "chat reply generated in {:.2}s",
            now.elapsed().as_secs_f64()
        );

        reply
    }
}
