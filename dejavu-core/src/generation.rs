//! Text-generation collaborator — answers for first-seen questions.
//!
//! Provides an `AnswerGenerator` trait with implementations for:
//! - **Completion API** — an OpenAI-style `/v1/completions` endpoint
//! - **Disabled** — always fails; used when no API key is configured so the
//!   caller's placeholder-answer path still works
//!
//! The collaborator is fallible by contract: callers must substitute a
//! visible placeholder answer on failure, never crash.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::config::GenerationConfig;

/// Abstraction over text-generation providers.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer for the given prompt.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing completion text in response")]
    MissingCompletion,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },

    #[error("Generation disabled: no API key configured")]
    Disabled,
}

/// Completion client settings, resolved from config plus the
/// `OPENAI_API_KEY` environment fallback.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_key: String,
    pub model: String,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl CompletionSettings {
    pub fn new(api_key: Option<String>, config: &GenerationConfig) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

// ============================================================================
// Completion API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// CompletionClient
// ============================================================================

/// Completion client — calls an OpenAI-style completions API.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    settings: CompletionSettings,
    base_url: String,
}

impl CompletionClient {
    pub fn new(settings: CompletionSettings, base_url: String) -> Result<Self, GenerationError> {
        if settings.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            settings,
            base_url,
        })
    }

    /// Generate a completion with retries and jittered exponential backoff.
    pub async fn generate_raw(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.settings.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.settings.max_retries);

        let result = Retry::spawn(retry_strategy, || self.generate_once(prompt, max_tokens)).await;

        match result {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::error!(
                    attempts = self.settings.max_retries,
                    error = %e,
                    "All generation retry attempts failed"
                );
                Err(GenerationError::RetryExhausted {
                    attempts: self.settings.max_retries,
                })
            }
        }
    }

    async fn generate_once(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/v1/completions", self.base_url);

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            prompt: prompt.to_string(),
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Completion API error");

            return Err(GenerationError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or(GenerationError::MissingCompletion)?;

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl AnswerGenerator for CompletionClient {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        self.generate_raw(prompt, max_tokens).await
    }

    fn name(&self) -> &str {
        "completion-api"
    }
}

// ============================================================================
// DisabledGenerator
// ============================================================================

/// Generator used when no API key is configured. Every call fails with
/// `GenerationError::Disabled`; the answer-resolution layer substitutes its
/// placeholder answer.
#[derive(Debug, Clone, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl AnswerGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_settings(api_key: &str) -> CompletionSettings {
        CompletionSettings {
            api_key: api_key.to_string(),
            model: "gpt-3.5-turbo-instruct".to_string(),
            max_retries: 3,
            retry_delay_ms: 50,
        }
    }

    fn mock_completion_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                { "text": text }
            ]
        })
    }

    #[tokio::test]
    async fn test_generate_calls_api_and_trims_text() {
        let mock_server = MockServer::start().await;
        let client = CompletionClient::new(test_settings("test-api-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(body_json(serde_json::json!({
                "model": "gpt-3.5-turbo-instruct",
                "prompt": "How do magnets work?",
                "max_tokens": 150
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mock_completion_response("\n\nMagnets work because...  ")),
            )
            .mount(&mock_server)
            .await;

        let result = client.generate_raw("How do magnets work?", 150).await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        assert_eq!(result.unwrap(), "Magnets work because...");
    }

    #[tokio::test]
    async fn test_generate_returns_error_on_api_500() {
        let mock_server = MockServer::start().await;
        let client = CompletionClient::new(test_settings("test-api-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "Internal server error" }
            })))
            .mount(&mock_server)
            .await;

        let result = client.generate_raw("prompt", 10).await;

        assert!(result.is_err(), "Expected error on 500 response");
        match result {
            Err(GenerationError::RetryExhausted { attempts }) => {
                assert_eq!(attempts, 3, "Expected 3 retry attempts");
            }
            _ => panic!("Expected RetryExhausted error"),
        }
    }

    #[tokio::test]
    async fn test_generate_retries_on_429_then_succeeds() {
        let mock_server = MockServer::start().await;
        let client = CompletionClient::new(test_settings("test-api-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit exceeded" }
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("An answer.")),
            )
            .mount(&mock_server)
            .await;

        let result = client.generate_raw("prompt", 10).await;

        assert!(result.is_ok(), "Expected success after retry");
        assert_eq!(result.unwrap(), "An answer.");
    }

    #[tokio::test]
    async fn test_client_fails_with_missing_api_key() {
        let result = CompletionClient::new(test_settings(""), "http://localhost".to_string());

        assert!(result.is_err(), "Expected error with missing API key");
        match result {
            Err(GenerationError::MissingApiKey) => {}
            _ => panic!("Expected MissingApiKey error"),
        }
    }

    #[tokio::test]
    async fn test_generate_missing_choices_is_error() {
        let mock_server = MockServer::start().await;
        let client = CompletionClient::new(test_settings("test-api-key"), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&mock_server)
            .await;

        let result = client.generate_raw("prompt", 10).await;

        assert!(result.is_err());
        match result {
            Err(GenerationError::MissingCompletion) | Err(GenerationError::RetryExhausted { .. }) => {}
            other => panic!("Expected MissingCompletion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disabled_generator_always_fails() {
        let gen = DisabledGenerator;
        let result = gen.generate("anything", 10).await;
        assert!(matches!(result, Err(GenerationError::Disabled)));
        assert_eq!(gen.name(), "disabled");
    }
}
