//! Anthropic Messages API client.
//!
//! This module provides the request/response types shared by all backends
//! and a reqwest-based client for the hosted Messages endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::LlmError;

/// Default API endpoint.
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// API version header sent with every request.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request timeout in seconds. A full episode script can take several
/// minutes to generate, so this is generous.
const REQUEST_TIMEOUT_SECS: u64 = 600;

/// A message in a conversation with the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender ("user" or "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for text generation from the backend.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier to use for generation.
    pub model: String,
    /// System instruction, if any.
    pub system: Option<String>,
    /// Conversation messages, in order.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 1.0).
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Create a new generation request with default parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages,
            temperature: None,
            max_tokens: 4096,
        }
    }

    /// Set the system instruction for this request.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max output tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from a generation request.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Unique identifier for this response.
    pub id: String,
    /// Model that generated this response.
    pub model: String,
    /// Generated text, with multiple content blocks concatenated.
    pub text: String,
    /// Reason the generation stopped (e.g., "end_turn", "max_tokens").
    pub stop_reason: Option<String>,
    /// Token usage statistics.
    pub usage: Usage,
}

/// Token usage statistics for a generation request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub input_tokens: u32,
    /// Number of tokens generated.
    pub output_tokens: u32,
}

impl Usage {
    /// Total tokens consumed by the request.
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Trait for backends that can generate text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    /// API key for authentication.
    api_key: String,
    /// Base URL for the API.
    base_url: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl AnthropicClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            http_client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client - system TLS configuration error"),
        }
    }

    /// Override the base URL.
    ///
    /// Useful for testing or API-compatible proxies.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Create a client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `ANTHROPIC_API_KEY`: API key for authentication (required)
    /// - `ANTHROPIC_BASE_URL`: Base URL override (optional)
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if `ANTHROPIC_API_KEY` is not set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| LlmError::MissingApiKey)?;
        let mut client = Self::new(api_key);
        if let Ok(base_url) = env::var("ANTHROPIC_BASE_URL") {
            client.base_url = base_url;
        }
        Ok(client)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the API key as a masked value safe for logging.
    pub fn api_key_masked(&self) -> String {
        if self.api_key.len() <= 8 {
            "*".repeat(self.api_key.len())
        } else {
            format!(
                "{}...{}",
                &self.api_key[..4],
                &self.api_key[self.api_key.len() - 4..]
            )
        }
    }
}

/// Internal request structure for the Messages API.
#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
}

/// Internal response structure from the Messages API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    model: String,
    content: Vec<ApiContentBlock>,
    stop_reason: Option<String>,
    usage: ApiUsage,
}

/// A single content block in the API response.
#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// Internal usage structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let api_request = ApiRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: &request.messages,
        };

        let url = format!("{}/v1/messages", self.base_url);

        let http_response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();

            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            // Try to parse as structured error
            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                let detail = error_response.error;
                if status_code == 429 {
                    return Err(LlmError::RateLimited(detail.message));
                }
                if detail.error_type.as_deref() == Some("overloaded_error") {
                    return Err(LlmError::Overloaded(detail.message));
                }
                return Err(LlmError::ApiError {
                    code: status_code,
                    message: detail.message,
                });
            }

            // Fall back to raw error text
            return Err(LlmError::ApiError {
                code: status_code,
                message: error_text,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let text: String = api_response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect();

        Ok(GenerationResponse {
            id: api_response.id,
            model: api_response.model,
            text,
            stop_reason: api_response.stop_reason,
            usage: Usage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        })
    }
}
