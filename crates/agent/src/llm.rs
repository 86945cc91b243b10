//! Gateway to the remote text-generation endpoint.
//!
//! [`LlmClient`] performs exactly one HTTP exchange and classifies the
//! outcome into [`LlmFailure`]. [`LlmGateway`] composes the request text,
//! applies the retry policy and downgrades every failure to a fixed
//! user-facing string, so callers always get text back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use legaltune_core::config::LlmConfig;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const SYSTEM_INSTRUCTIONS: &str = "You are a Legal Information Assistant.
You explain laws, rights, and legal procedures in simple language.
You do NOT provide legal advice, predictions, or guarantees.
You assist users by explaining concepts, risks, options, and procedures.
You always include a disclaimer for case-related questions.
You adapt responses to the user’s language and education level.";

pub const UNAVAILABLE_MESSAGE: &str =
    "⚠️ The AI service is temporarily unavailable. Please try again later.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "Error: Empty response from AI.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmFailure {
    #[error("rate limited by upstream (HTTP 429)")]
    RateLimited,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("malformed response body: {0}")]
    Malformed(String),
    #[error("response contained no candidate text")]
    Empty,
}

impl LlmFailure {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Fixed text shown to the user in place of the failed generation.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Malformed(_) | Self::Empty => EMPTY_RESPONSE_MESSAGE,
            Self::RateLimited | Self::Transport(_) | Self::Upstream { .. } => UNAVAILABLE_MESSAGE,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate_content(&self, text: &str) -> Result<String, LlmFailure>;
}

/// Gemini `generateContent` over HTTPS with the key passed as a query
/// parameter.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmFailure> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmFailure::Transport(error.to_string()))?;

        Ok(Self {
            http,
            endpoint: generate_content_url(&config.base_url, &config.model),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_content(&self, text: &str) -> Result<String, LlmFailure> {
        let body = json!({ "contents": [{ "parts": [{ "text": text }] }] });

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let payload = response.text().await.map_err(classify_transport_error)?;
        classify_response(status, &payload)
    }
}

pub fn generate_content_url(base_url: &str, model: &str) -> String {
    format!("{}/models/{}:generateContent", base_url.trim_end_matches('/'), model)
}

/// Failures before a status line arrives. The URL is dropped because it
/// carries the key.
fn classify_transport_error(error: reqwest::Error) -> LlmFailure {
    LlmFailure::Transport(error.without_url().to_string())
}

/// Maps one HTTP exchange onto the gateway's outcome classes.
pub fn classify_response(status: StatusCode, body: &str) -> Result<String, LlmFailure> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmFailure::RateLimited);
    }
    if !status.is_success() {
        return Err(LlmFailure::Upstream {
            status: status.as_u16(),
            message: upstream_message(body),
        });
    }

    let data: Value =
        serde_json::from_str(body).map_err(|error| LlmFailure::Malformed(error.to_string()))?;

    let first_part = data
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .ok_or(LlmFailure::Empty)?;

    Ok(first_part.get("text").and_then(Value::as_str).unwrap_or_default().to_owned())
}

fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value.pointer("/error/message").and_then(Value::as_str).map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// System block, then the prompt, then the optional language directive, as a
/// single text part.
pub fn compose_request(prompt: &str, language: Option<&str>) -> String {
    let directive = language
        .map(|language| format!("\n\nIMPORTANT: Provide the response in {language} language."))
        .unwrap_or_default();
    format!("{SYSTEM_INSTRUCTIONS}\n\n{prompt}{directive}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_backoff: Duration::from_secs(2) }
    }
}

impl From<&LlmConfig> for RetryPolicy {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_secs(config.initial_backoff_secs),
        }
    }
}

#[derive(Clone)]
pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    retry: RetryPolicy,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Never fails: exhausted retries and non-retryable failures come back as
    /// the matching user-facing message.
    pub async fn generate(&self, prompt: &str, language: Option<&str>) -> String {
        match self.try_generate(prompt, language).await {
            Ok(text) => text,
            Err(failure) => failure.user_message().to_owned(),
        }
    }

    /// Same retry loop as [`generate`](Self::generate) but hands the final
    /// failure back to the caller.
    pub async fn try_generate(
        &self,
        prompt: &str,
        language: Option<&str>,
    ) -> Result<String, LlmFailure> {
        let correlation_id = Uuid::new_v4();
        let request = compose_request(prompt, language);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;

        loop {
            info!(
                event_name = "llm.request.attempt",
                correlation_id = %correlation_id,
                attempt,
                max_attempts,
                prompt_chars = request.chars().count(),
                "calling text generation endpoint"
            );

            let failure = match self.client.generate_content(&request).await {
                Ok(text) => return Ok(text),
                Err(failure) => failure,
            };

            if failure.is_retryable() && attempt < max_attempts {
                warn!(
                    event_name = "llm.request.rate_limited",
                    correlation_id = %correlation_id,
                    attempt,
                    backoff_secs = backoff.as_secs_f64(),
                    "rate limited, retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
                attempt += 1;
                continue;
            }

            error!(
                event_name = "llm.request.failed",
                correlation_id = %correlation_id,
                attempt,
                error = %failure,
                "text generation failed"
            );
            return Err(failure);
        }
    }
}
