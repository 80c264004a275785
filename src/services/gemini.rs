//! Gemini adapter
//!
//! Gemini has no schema parameter in this integration: the schema is
//! appended to the prompt as an instruction and the output MIME type is
//! switched to JSON. The answer is always returned as text.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ProviderFamily;
use crate::schemas::gemini::{
    GeminiContent, GeminiRequest, GeminiResponse, GenerationConfig, JSON_MIME_TYPE,
};
use crate::services::{
    send_request, CompletionProvider, CompletionRequest, Envelope, ModelResult, ProviderError,
    RawReply,
};

/// Adapter for Google's `generateContent` API
#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiService {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// Build the outbound body for one model
pub fn build_request(request: &CompletionRequest) -> GeminiRequest {
    let (text, response_mime_type) = match request.json_schema() {
        Some(schema) => (
            prompt_with_schema(request.prompt(), schema),
            Some(JSON_MIME_TYPE.to_string()),
        ),
        None => (request.prompt().to_string(), None),
    };

    GeminiRequest {
        contents: vec![GeminiContent::user(text)],
        generation_config: Some(GenerationConfig {
            max_output_tokens: Some(request.max_output_tokens()),
            response_mime_type,
        }),
    }
}

fn prompt_with_schema(prompt: &str, schema: &serde_json::Value) -> String {
    format!(
        "{}\n\nRespond only with JSON that conforms to this JSON schema:\n{}",
        prompt, schema
    )
}

/// Classify a `generateContent` reply
pub fn interpret(reply: &RawReply) -> Envelope {
    let parsed = serde_json::from_str::<GeminiResponse>(&reply.body);

    if !reply.status.is_success() {
        let message = parsed
            .ok()
            .and_then(|r| r.error)
            .map(|e| e.message)
            .unwrap_or_else(|| reply.fallback_message());
        return Envelope::ProviderError(message);
    }

    let response = match parsed {
        Ok(response) => response,
        Err(e) => return Envelope::Malformed(format!("invalid JSON body: {}", e)),
    };

    if let Some(error) = response.error {
        return Envelope::ProviderError(error.message);
    }

    let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
        let reason = response.prompt_feedback.and_then(|f| f.block_reason);
        return Envelope::Malformed(match reason {
            Some(reason) => format!("no candidates returned (blocked: {})", reason),
            None => "no candidates returned".to_string(),
        });
    };

    let finish_reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
    match candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
    {
        Some(text) => Envelope::Success(ModelResult::Text(text)),
        None => Envelope::Malformed(format!(
            "first candidate has no text part (finish reason: {})",
            finish_reason
        )),
    }
}

#[async_trait]
impl CompletionProvider for GeminiService {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Gemini
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<ModelResult, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredentials {
                family: self.family(),
                model: model.to_string(),
            })?;

        let url = self.endpoint(model);
        tracing::debug!(
            model = %model,
            url = %url,
            structured = request.json_schema().is_some(),
            "Calling Gemini generateContent API"
        );

        let http_request = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&build_request(request));

        let reply = send_request(self.family(), model, http_request).await?;

        interpret(&reply)
            .into_result(self.family(), model, reply.status)
            .inspect_err(|e| tracing::error!(model = %model, error = %e, "Gemini call failed"))
    }
}

// ============================================================================
// Tests
// ============================================================================
