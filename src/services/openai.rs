//! ChatGPT adapter
//!
//! Object schemas are sent as a strict `json_schema` response format. Any
//! other schema value is dropped with a warning and the call proceeds
//! unconstrained. The answer is always returned as text.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ProviderFamily;
use crate::schemas::openai::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, JsonSchemaFormat, ResponseFormat,
};
use crate::services::{
    send_request, CompletionProvider, CompletionRequest, Envelope, ModelResult, ProviderError,
    RawReply, STRUCTURED_OUTPUT_NAME,
};

/// Adapter for the OpenAI Chat Completions API
#[derive(Clone)]
pub struct ChatGptService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ChatGptService {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Build the outbound body for one model
pub fn build_request(model: &str, request: &CompletionRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        max_tokens: request.max_output_tokens(),
        messages: vec![ChatMessage::user(request.prompt())],
        response_format: request
            .json_schema()
            .and_then(|schema| response_format(model, schema)),
    }
}

fn response_format(model: &str, schema: &serde_json::Value) -> Option<ResponseFormat> {
    if !schema.is_object() {
        tracing::warn!(
            model = %model,
            schema_kind = json_kind(schema),
            "JSON schema is not an object, sending request without response_format"
        );
        return None;
    }

    Some(ResponseFormat::JsonSchema {
        json_schema: JsonSchemaFormat {
            name: STRUCTURED_OUTPUT_NAME.to_string(),
            strict: true,
            schema: schema.clone(),
        },
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Classify a chat completion reply
pub fn interpret(reply: &RawReply) -> Envelope {
    let parsed = serde_json::from_str::<ChatCompletionResponse>(&reply.body);

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

    let Some(choice) = response.choices.and_then(|c| c.into_iter().next()) else {
        return Envelope::Malformed("no choices returned".to_string());
    };

    match (choice.message.content, choice.message.refusal) {
        (Some(content), _) => Envelope::Success(ModelResult::Text(content)),
        (None, Some(refusal)) => Envelope::ProviderError(format!("model refused: {}", refusal)),
        (None, None) => Envelope::Malformed("first choice has no message content".to_string()),
    }
}

#[async_trait]
impl CompletionProvider for ChatGptService {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::ChatGpt
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

        let body = build_request(model, request);
        tracing::debug!(
            model = %model,
            structured = body.response_format.is_some(),
            "Calling OpenAI chat completions API"
        );

        let http_request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body);

        let reply = send_request(self.family(), model, http_request).await?;

        interpret(&reply)
            .into_result(self.family(), model, reply.status)
            .inspect_err(|e| tracing::error!(model = %model, error = %e, "ChatGPT call failed"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use reqwest::StatusCode;
    use serde_json::json;

    fn ok(body: serde_json::Value) -> RawReply {
        RawReply {
            status: StatusCode::OK,
            body: body.to_string(),
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn test_object_schema_becomes_strict_response_format() {
        let schema = json!({"type": "object", "properties": {"colors": {"type": "array"}}});
        let request = CompletionRequest::new("List two colors", Some(schema.clone()), 1024).unwrap();

        let body = serde_json::to_value(build_request("gpt-4o", &request)).unwrap();

        assert_eq!(
            body["response_format"],
            json!({
                "type": "json_schema",
                "json_schema": {"name": "my_custom", "strict": true, "schema": schema}
            })
        );
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"], json!([{"role": "user", "content": "List two colors"}]));
    }

    #[test]
    fn test_non_object_schema_is_dropped() {
        for schema in [json!("a string"), json!([1, 2]), json!(42)] {
            let request = CompletionRequest::new("Hi", Some(schema), 1024).unwrap();
            let body = serde_json::to_value(build_request("gpt-4o-mini", &request)).unwrap();
            assert!(body.get("response_format").is_none());
        }
    }

    #[test]
    fn test_no_schema_means_no_response_format() {
        let request = CompletionRequest::new("Hi", None, 1024).unwrap();
        assert!(build_request("gpt-4o", &request).response_format.is_none());
    }

    #[test]
    fn test_interpret_first_choice_content() {
        assert_eq!(
            interpret(&ok(completion("Hello there"))),
            Envelope::Success(ModelResult::Text("Hello there".into()))
        );
    }

    #[test]
    fn test_interpret_refusal_and_missing_content() {
        let refusal = json!({"choices": [{"message": {"role": "assistant", "content": null, "refusal": "I can't help"}}]});
        assert_eq!(
            interpret(&ok(refusal)),
            Envelope::ProviderError("model refused: I can't help".into())
        );

        let empty = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        assert!(matches!(interpret(&ok(empty)), Envelope::Malformed(_)));

        assert!(matches!(interpret(&ok(json!({"choices": []}))), Envelope::Malformed(_)));
    }

    #[test]
    fn test_interpret_error_envelope() {
        let reply = RawReply {
            status: StatusCode::UNAUTHORIZED,
            body: json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}})
                .to_string(),
        };
        assert_eq!(
            interpret(&reply),
            Envelope::ProviderError("Incorrect API key provided".into())
        );
    }

    #[tokio::test]
    async fn test_invoke_sends_schema_and_returns_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "response_format": {"type": "json_schema", "json_schema": {"name": "my_custom"}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion(r#"{"colors":["red","blue"]}"#).to_string())
            .create_async()
            .await;

        let service = ChatGptService::new(Client::new(), server.url(), Some("sk-test".into()));
        let request =
            CompletionRequest::new("List two colors", Some(json!({"type": "object"})), 1024).unwrap();

        let result = service.invoke("gpt-4o", &request).await.unwrap();

        assert_eq!(result, ModelResult::Text(r#"{"colors":["red","blue"]}"#.into()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invoke_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("")
            .create_async()
            .await;

        let service = ChatGptService::new(Client::new(), server.url(), Some("sk-test".into()));
        let request = CompletionRequest::new("Hi", None, 1024).unwrap();

        let err = service.invoke("gpt-4o-mini", &request).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.family(), ProviderFamily::ChatGpt);
    }
}
