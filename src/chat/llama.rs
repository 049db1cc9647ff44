use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::generator::{GenerationError, GenerationParams, TextGenerator};

/// Client for a llama.cpp server `/completion` endpoint.
pub struct LlamaCppClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: usize,
    temperature: f32,
    repeat_penalty: f32,
    stop: &'a [String],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

impl LlamaCppClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8081`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: completion_url(base_url),
        })
    }
}

fn completion_url(base_url: &str) -> String {
    format!("{}/completion", base_url.trim_end_matches('/'))
}

impl TextGenerator for LlamaCppClient {
    fn name(&self) -> &str {
        &self.endpoint
    }

    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            prompt,
            n_predict: params.max_tokens,
            temperature: params.temperature,
            repeat_penalty: params.repeat_penalty,
            stop: &params.stop,
            stream: false,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(map_reqwest_error)?;

        let body = resp
            .json::<CompletionResponse>()
            .map_err(map_reqwest_error)?;

        Ok(body.content)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_url() {
        assert_eq!(
            completion_url("http://127.0.0.1:8081/"),
            "http://127.0.0.1:8081/completion"
        );
        assert_eq!(completion_url("http://llm:80"), "http://llm:80/completion");
    }

    #[test]
    fn test_request_shape() {
        let params = GenerationParams::default();
        let request = CompletionRequest {
            prompt: "Instruct: hi",
            n_predict: params.max_tokens,
            temperature: params.temperature,
            repeat_penalty: params.repeat_penalty,
            stop: &params.stop,
            stream: false,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["n_predict"], 100);
        assert_eq!(value["stream"], false);
        assert_eq!(value["stop"][0], "Instruct:");
    }

    #[test]
    fn test_unreachable_server_is_backend_error() {
        let client = LlamaCppClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.complete("hi", &GenerationParams::default());
        assert!(matches!(
            result,
            Err(GenerationError::Backend(_)) | Err(GenerationError::Timeout)
        ));
    }
}
