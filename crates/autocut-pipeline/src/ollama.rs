//! Ollama client for transcript text cleaning.
//!
//! Posts generate requests (`stream: false`) to a local Ollama server with
//! bounded retry and exponential backoff.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::OllamaConfig;
use crate::error::StageResult;
use crate::retry::{retry_async_when, RetryConfig};

/// Timeout of the reachability probe.
const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("text generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed generate response: {0}")]
    MalformedResponse(String),

    #[error("text generation failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<OllamaError> },
}

impl OllamaError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, OllamaError::Http(_) | OllamaError::Status { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            OllamaError::Http(e) => e.is_timeout(),
            OllamaError::RetriesExhausted { last, .. } => last.is_timeout(),
            _ => false,
        }
    }
}

/// Text-cleaning capability.
#[async_trait]
pub trait TextCleaner: Send + Sync {
    /// Send one prompt and return the generated text.
    async fn clean(&self, prompt: &str) -> StageResult<String>;

    /// Whether the service answers at all.
    async fn is_reachable(&self) -> bool;

    /// Human-readable endpoint for precondition messages.
    fn endpoint(&self) -> String;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// [`TextCleaner`] backed by the Ollama HTTP API.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, OllamaError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            retry: RetryConfig::new("ollama_generate")
                .with_max_attempts(config.max_attempts)
                .with_base_delay(config.retry_base_delay),
        })
    }

    /// One generate call, no retry.
    async fn generate_once(&self, prompt: &str) -> Result<String, OllamaError> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, prompt_len = prompt.len(), "POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::MalformedResponse(e.to_string()))?;
        Ok(body.response)
    }

    /// Generate with retry. Exhausted retries wrap the last error.
    pub async fn generate(&self, prompt: &str) -> Result<String, OllamaError> {
        retry_async_when(&self.retry, || self.generate_once(prompt), OllamaError::is_transient)
            .await
            .map_failure(|last, attempts| {
                if attempts > 1 {
                    OllamaError::RetriesExhausted {
                        attempts,
                        last: Box::new(last),
                    }
                } else {
                    last
                }
            })
    }
}

#[async_trait]
impl TextCleaner for OllamaClient {
    async fn clean(&self, prompt: &str) -> StageResult<String> {
        Ok(self.generate(prompt).await?)
    }

    async fn is_reachable(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(REACHABILITY_TIMEOUT).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                info!("Ollama not reachable at {}: {}", self.base_url, e);
                false
            }
        }
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str, max_attempts: u32) -> OllamaConfig {
        OllamaConfig {
            url: url.to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(5),
            max_attempts,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_generate_sends_non_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(json!({"model": "llama3", "prompt": "hello", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hello."})))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(&config(&server.uri(), 3)).unwrap();
        assert_eq!(client.clean("hello").await.unwrap(), "Hello.");
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&config(&server.uri(), 3)).unwrap();
        assert_eq!(client.generate("x").await.unwrap(), "ok");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&config(&server.uri(), 3)).unwrap();
        let err = client.generate("x").await.unwrap_err();
        match &err {
            OllamaError::RetriesExhausted { attempts, last } => {
                assert_eq!(*attempts, 3);
                assert!(matches!(**last, OllamaError::Status { status: 503, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 3);

        let stage_err: StageError = err.into();
        assert!(stage_err.to_string().starts_with("Processing error: "));
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&config(&server.uri(), 3)).unwrap();
        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, OllamaError::MalformedResponse(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri(), 1);
        cfg.timeout = Duration::from_millis(50);
        let client = OllamaClient::new(&cfg).unwrap();
        let err = client.clean("x").await.unwrap_err();
        assert!(matches!(err, StageError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_reachability() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&config(&server.uri(), 1)).unwrap();
        assert!(client.is_reachable().await);

        let unreachable = OllamaClient::new(&config("http://127.0.0.1:9", 1)).unwrap();
        assert!(!unreachable.is_reachable().await);
    }
}
