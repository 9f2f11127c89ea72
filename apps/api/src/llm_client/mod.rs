/// LLM Client: the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All model interactions MUST go through the `ModelInvoker` trait.
///
/// One attempt per call. A slow or broken reply fails fast under the
/// transport timeout; retrying is a new top-level request.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod prompts;

use prompts::JSON_ONLY_SYSTEM;

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Model request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed API response: {0}")]
    Decode(String),

    #[error("Model reply contained no text segment")]
    EmptyContent,
}

/// Sends one prompt to the generation backend and returns its raw text reply.
///
/// Carried in `RoastPipeline` as `Arc<dyn ModelInvoker>` so tests can swap in
/// a canned backend.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The LLM client used by the roast pipeline.
/// Wraps the Anthropic Messages API with a bounded output size and timeout.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    max_tokens: u32,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(api_key: String, endpoint: String, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint,
            max_tokens,
            timeout,
        }
    }

    /// Makes a single raw call to the Claude API, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, InvocationError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: self.max_tokens,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(InvocationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let llm_response: LlmResponse =
            serde_json::from_str(&body).map_err(|e| InvocationError::Decode(e.to_string()))?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        Ok(llm_response)
    }

    fn transport_error(&self, e: reqwest::Error) -> InvocationError {
        if e.is_timeout() {
            InvocationError::Timeout(self.timeout)
        } else {
            InvocationError::Http(e)
        }
    }
}

#[async_trait]
impl ModelInvoker for LlmClient {
    async fn invoke(&self, prompt: &str) -> Result<String, InvocationError> {
        let response = self.call(prompt, JSON_ONLY_SYSTEM).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(InvocationError::EmptyContent)
    }
}
