use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::fixtures::{chat_service, movie_catalog, BrokenQueryEmbedder, Script, ScriptedGenerator};
use crate::catalog::Catalog;
use crate::chat::{
    ChatService, GenerationParams, ResponseGenerator, BUSY_REPLY, FALLBACK_PREFIX, NO_MATCHES_REPLY,
};
use crate::semantic::SemanticRetriever;

#[test]
fn test_without_model_answers_with_context() {
    let service = chat_service(None);

    let reply = service.retrieve_and_answer("space adventure");
    assert!(reply.starts_with(FALLBACK_PREFIX), "{reply}");
    assert!(reply.contains("Movie: Interstellar\nDetails: "), "{reply}");
    assert_eq!(reply.matches("Movie: ").count(), 3);
}

#[test]
fn test_reply_is_first_line_of_generation() {
    let generator = ScriptedGenerator::new(Script::Reply(
        "  Watch Interstellar, it is a space epic.\nUser: and another?\n".to_string(),
    ));
    let prompts = generator.prompts.clone();
    let service = chat_service(Some(Box::new(generator)));

    let reply = service.retrieve_and_answer("space adventure");
    assert_eq!(reply, "Watch Interstellar, it is a space epic.");

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("User: space adventure"));
    assert!(prompts[0].contains("Movie: Interstellar"));
    assert!(prompts[0].ends_with("Output:"));
}

#[test]
fn test_generation_failure_falls_back() {
    for script in [Script::Fail, Script::Timeout] {
        let service = chat_service(Some(Box::new(ScriptedGenerator::new(script))));

        let reply = service.retrieve_and_answer("romance");
        assert!(reply.starts_with(FALLBACK_PREFIX), "{reply}");
        assert!(reply.contains("Movie: "), "{reply}");
    }
}

#[test]
fn test_empty_corpus_has_no_matches() {
    let retriever = super::fixtures::retriever(Arc::new(Catalog::default()));
    let service = ChatService::new(
        retriever,
        ResponseGenerator::new(None, GenerationParams::default()),
        3,
    );

    assert_eq!(service.retrieve_and_answer("space"), NO_MATCHES_REPLY);
}

#[test]
fn test_retrieval_failure_is_busy() {
    let retriever =
        SemanticRetriever::build(movie_catalog(), Arc::new(BrokenQueryEmbedder), None).unwrap();
    let service = ChatService::new(
        retriever,
        ResponseGenerator::new(None, GenerationParams::default()),
        3,
    );

    assert_eq!(service.retrieve_and_answer("space"), BUSY_REPLY);
}

#[test]
fn test_generation_is_serialized() {
    let mut generator = ScriptedGenerator::new(Script::Reply("Try Heat.".to_string()));
    generator.delay = Duration::from_millis(20);
    let max_in_flight = generator.max_in_flight.clone();

    let service = Arc::new(chat_service(Some(Box::new(generator))));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || service.retrieve_and_answer("heist"))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "Try Heat.");
    }
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
}
