//! Services module
//!
//! Provider adapters and the fan-out orchestrator. Each adapter turns a
//! [`CompletionRequest`] into one upstream HTTP call and classifies the
//! reply into an [`Envelope`] before converting it into a [`ModelResult`].

pub mod anthropic;
pub mod comparison;
pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ProviderFamily;

pub use anthropic::ClaudeService;
pub use comparison::{CompareError, ComparisonResponse, ComparisonService, Providers};
pub use gemini::GeminiService;
pub use openai::ChatGptService;

/// Tool / schema name used for structured output requests
pub const STRUCTURED_OUTPUT_NAME: &str = "my_custom";

// ============================================================================
// Request / Result Types
// ============================================================================

/// Provider-agnostic input shared by every adapter invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    prompt: String,
    json_schema: Option<serde_json::Value>,
    max_output_tokens: u32,
}

impl CompletionRequest {
    /// Returns `None` when the prompt is empty after trimming.
    pub fn new(
        prompt: impl Into<String>,
        json_schema: Option<serde_json::Value>,
        max_output_tokens: u32,
    ) -> Option<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return None;
        }

        Some(Self {
            prompt,
            json_schema,
            max_output_tokens,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn json_schema(&self) -> Option<&serde_json::Value> {
        self.json_schema.as_ref()
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }
}

/// Normalized answer from one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelResult {
    /// Free text (always the case for Gemini and ChatGPT)
    Text(String),
    /// Parsed structured value (Claude tool input)
    Structured(serde_json::Value),
}

impl ModelResult {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ModelResult::Text(text) => Some(text),
            ModelResult::Structured(_) => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ModelResult::Structured(_))
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by a single adapter invocation
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{family} API key is missing")]
    MissingCredentials { family: ProviderFamily, model: String },

    #[error("{family} request for {model} failed: {source}")]
    Request {
        family: ProviderFamily,
        model: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{family} API error for {model}: {}", upstream_detail(.status, .message))]
    Upstream {
        family: ProviderFamily,
        model: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Unexpected response structure from {family} API for {model}: {message}")]
    MalformedResponse {
        family: ProviderFamily,
        model: String,
        message: String,
    },
}

fn upstream_detail(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("{} {}", code, message),
        None => message.to_string(),
    }
}

impl ProviderError {
    pub fn family(&self) -> ProviderFamily {
        match self {
            ProviderError::MissingCredentials { family, .. }
            | ProviderError::Request { family, .. }
            | ProviderError::Upstream { family, .. }
            | ProviderError::MalformedResponse { family, .. } => *family,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderError::MissingCredentials { model, .. }
            | ProviderError::Request { model, .. }
            | ProviderError::Upstream { model, .. }
            | ProviderError::MalformedResponse { model, .. } => model,
        }
    }

    /// HTTP status from the upstream, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Upstream { status, .. } => *status,
            ProviderError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// ============================================================================
// Envelope Classification
// ============================================================================

/// Closed set of outcomes every provider reply is classified into
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(ModelResult),
    ProviderError(String),
    Malformed(String),
}

impl Envelope {
    pub fn into_result(
        self,
        family: ProviderFamily,
        model: &str,
        status: StatusCode,
    ) -> Result<ModelResult, ProviderError> {
        match self {
            Envelope::Success(result) => Ok(result),
            Envelope::ProviderError(message) => Err(ProviderError::Upstream {
                family,
                model: model.to_string(),
                status: (!status.is_success()).then(|| status.as_u16()),
                message,
            }),
            Envelope::Malformed(message) => Err(ProviderError::MalformedResponse {
                family,
                model: model.to_string(),
                message,
            }),
        }
    }
}

/// Status and body text of an upstream reply
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: StatusCode,
    pub body: String,
}

impl RawReply {
    /// Message for a non-2xx reply whose body has no recognizable error envelope
    pub fn fallback_message(&self) -> String {
        let body = self.body.trim();
        if body.is_empty() {
            self.status.to_string()
        } else {
            body.to_string()
        }
    }
}

/// Send a prepared request and read the whole body.
///
/// Transport failures become [`ProviderError::Request`]; status handling is
/// left to the adapter's envelope classification.
pub async fn send_request(
    family: ProviderFamily,
    model: &str,
    request: RequestBuilder,
) -> Result<RawReply, ProviderError> {
    let to_error = |source: reqwest::Error| ProviderError::Request {
        family,
        model: model.to_string(),
        source,
    };

    let response = request.send().await.map_err(to_error)?;
    let status = response.status();
    let body = response.text().await.map_err(to_error)?;

    tracing::debug!(
        provider = %family,
        model = %model,
        status = status.as_u16(),
        body = %body,
        "Upstream response received"
    );

    Ok(RawReply { status, body })
}

/// Build the HTTP client shared by all adapters
pub fn build_http_client(timeout: Option<Duration>) -> reqwest::Result<Client> {
    let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

// ============================================================================
// Provider Trait
// ============================================================================

/// One upstream family's adapter
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn family(&self) -> ProviderFamily;

    /// Whether the credential for this family is present
    fn is_configured(&self) -> bool;

    async fn invoke(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<ModelResult, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completion_request_rejects_blank_prompt() {
        assert!(CompletionRequest::new("", None, 1024).is_none());
        assert!(CompletionRequest::new("  \n\t", None, 1024).is_none());

        let request = CompletionRequest::new(" hi ", Some(json!({"type": "object"})), 16).unwrap();
        assert_eq!(request.prompt(), " hi ");
        assert_eq!(request.max_output_tokens(), 16);
        assert!(request.json_schema().is_some());
    }

    #[test]
    fn test_model_result_untagged_shapes() {
        let text: ModelResult = serde_json::from_value(json!("hello")).unwrap();
        assert_eq!(text.as_text(), Some("hello"));

        let structured: ModelResult = serde_json::from_value(json!({"colors": ["red"]})).unwrap();
        assert!(structured.is_structured());
        assert_eq!(serde_json::to_value(&structured).unwrap(), json!({"colors": ["red"]}));
    }

    #[test]
    fn test_envelope_error_carries_status_only_when_failed() {
        let err = Envelope::ProviderError("Overloaded".into())
            .into_result(ProviderFamily::Claude, "claude-3-opus-20240229", StatusCode::SERVICE_UNAVAILABLE)
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.family(), ProviderFamily::Claude);
        assert_eq!(err.to_string(), "Claude API error for claude-3-opus-20240229: 503 Overloaded");

        let err = Envelope::ProviderError("refused".into())
            .into_result(ProviderFamily::ChatGpt, "gpt-4o", StatusCode::OK)
            .unwrap_err();
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "ChatGPT API error for gpt-4o: refused");
    }

    #[test]
    fn test_malformed_envelope_maps_to_malformed_error() {
        let err = Envelope::Malformed("no candidates".into())
            .into_result(ProviderFamily::Gemini, "gemini-1.5-pro", StatusCode::OK)
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
        assert_eq!(err.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_fallback_message_uses_status_for_empty_body() {
        let reply = RawReply {
            status: StatusCode::BAD_GATEWAY,
            body: "  ".to_string(),
        };
        assert_eq!(reply.fallback_message(), "502 Bad Gateway");
    }
}
