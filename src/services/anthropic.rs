//! Claude adapter
//!
//! A schema is expressed as a single tool whose `input_schema` is the
//! caller's schema, with `tool_choice` pinned to it. When the model answers
//! with a tool call its `input` is returned as a structured value, otherwise
//! the first block's text is returned.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ProviderFamily;
use crate::schemas::anthropic::{Message, MessageRequest, MessageResponse, Tool, ANTHROPIC_VERSION};
use crate::services::{
    send_request, CompletionProvider, CompletionRequest, Envelope, ModelResult, ProviderError,
    RawReply, STRUCTURED_OUTPUT_NAME,
};

const TOOL_DESCRIPTION: &str = "Return the answer as structured data matching the input schema.";

/// Adapter for the Anthropic Messages API
#[derive(Clone)]
pub struct ClaudeService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ClaudeService {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Build the outbound body for one model
pub fn build_request(model: &str, request: &CompletionRequest) -> MessageRequest {
    let message_request = MessageRequest::new(
        model,
        vec![Message::user(request.prompt())],
        request.max_output_tokens(),
    );

    match request.json_schema() {
        Some(schema) => message_request.with_forced_tool(Tool {
            name: STRUCTURED_OUTPUT_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            input_schema: schema.clone(),
        }),
        None => message_request,
    }
}

/// Classify a Messages API reply
///
/// `structured` says whether a schema was sent; only then is a block's
/// `input` taken as the result.
pub fn interpret(reply: &RawReply, structured: bool) -> Envelope {
    let response = match serde_json::from_str::<MessageResponse>(&reply.body) {
        Ok(response) => response,
        Err(_) if !reply.status.is_success() => {
            return Envelope::ProviderError(reply.fallback_message())
        }
        Err(e) => return Envelope::Malformed(format!("invalid JSON body: {}", e)),
    };

    if !reply.status.is_success() {
        return Envelope::ProviderError(
            response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| reply.fallback_message()),
        );
    }

    match (response.content.and_then(|c| c.into_iter().next()), response.error) {
        (Some(block), _) => match (structured, block.input, block.text) {
            (true, Some(input), _) => Envelope::Success(ModelResult::Structured(input)),
            (_, _, Some(text)) => Envelope::Success(ModelResult::Text(text)),
            _ => Envelope::Malformed(format!(
                "first content block of type '{}' has no text",
                block.block_type
            )),
        },
        (None, Some(error)) => Envelope::ProviderError(error.message),
        (None, None) => Envelope::Malformed("no content blocks returned".to_string()),
    }
}

#[async_trait]
impl CompletionProvider for ClaudeService {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Claude
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

        let structured = request.json_schema().is_some();
        tracing::debug!(
            model = %model,
            structured,
            "Calling Anthropic messages API"
        );

        let http_request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&build_request(model, request));

        let reply = send_request(self.family(), model, http_request).await?;

        interpret(&reply, structured)
            .into_result(self.family(), model, reply.status)
            .inspect_err(|e| tracing::error!(model = %model, error = %e, "Claude call failed"))
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

    fn tool_use_reply(input: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "tool_use", "id": "toolu_1", "name": "my_custom", "input": input}],
            "stop_reason": "tool_use"
        })
    }

    fn text_reply(text: &str) -> serde_json::Value {
        json!({
            "id": "msg_2",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn"
        })
    }

    #[test]
    fn test_schema_pins_tool_choice() {
        let schema = json!({"type": "object", "properties": {"colors": {"type": "array"}}});
        let request = CompletionRequest::new("List two colors", Some(schema.clone()), 1024).unwrap();

        let body = serde_json::to_value(build_request("claude-3-haiku-20240307", &request)).unwrap();

        assert_eq!(body["tool_choice"], json!({"type": "tool", "name": "my_custom"}));
        assert_eq!(body["tools"][0]["name"], "my_custom");
        assert_eq!(body["tools"][0]["input_schema"], schema);
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn test_no_schema_sends_plain_message() {
        let request = CompletionRequest::new("Hi", None, 1024).unwrap();
        let body = build_request("claude-3-opus-20240229", &request);
        assert!(body.tools.is_none());
        assert!(body.tool_choice.is_none());
    }

    #[test]
    fn test_interpret_tool_input_is_returned_verbatim() {
        let input = json!({"colors": ["red", "blue"]});
        assert_eq!(
            interpret(&ok(tool_use_reply(input.clone())), true),
            Envelope::Success(ModelResult::Structured(input))
        );
    }

    #[test]
    fn test_interpret_text_block() {
        assert_eq!(
            interpret(&ok(text_reply("Two colors: red, blue")), true),
            Envelope::Success(ModelResult::Text("Two colors: red, blue".into()))
        );
        assert_eq!(
            interpret(&ok(text_reply("Hi")), false),
            Envelope::Success(ModelResult::Text("Hi".into()))
        );
    }

    #[test]
    fn test_interpret_tool_block_without_schema_has_no_text() {
        let envelope = interpret(&ok(tool_use_reply(json!({}))), false);
        assert!(matches!(envelope, Envelope::Malformed(_)));
    }

    #[test]
    fn test_interpret_error_envelope_and_unexpected_shape() {
        let error = json!({"type": "error", "error": {"type": "invalid_request_error", "message": "max_tokens too large"}});
        assert_eq!(
            interpret(&ok(error), false),
            Envelope::ProviderError("max_tokens too large".into())
        );

        assert_eq!(
            interpret(&ok(json!({"content": []})), false),
            Envelope::Malformed("no content blocks returned".into())
        );
        assert!(matches!(interpret(&ok(json!({"id": "msg"})), false), Envelope::Malformed(_)));
    }

    #[test]
    fn test_interpret_error_status_with_unparsable_body() {
        let reply = RawReply {
            status: StatusCode::BAD_GATEWAY,
            body: "<html>bad gateway</html>".into(),
        };
        assert_eq!(
            interpret(&reply, false),
            Envelope::ProviderError("<html>bad gateway</html>".into())
        );
    }

    #[tokio::test]
    async fn test_invoke_returns_structured_input() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "ant-key")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-3-5-sonnet-20240620",
                "tool_choice": {"type": "tool", "name": "my_custom"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(tool_use_reply(json!({"colors": ["green", "purple"]})).to_string())
            .create_async()
            .await;

        let service = ClaudeService::new(Client::new(), server.url(), Some("ant-key".into()));
        let request =
            CompletionRequest::new("List two colors", Some(json!({"type": "object"})), 1024).unwrap();

        let result = service
            .invoke("claude-3-5-sonnet-20240620", &request)
            .await
            .unwrap();

        assert_eq!(result, ModelResult::Structured(json!({"colors": ["green", "purple"]})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invoke_overloaded_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(529)
            .with_body(json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}).to_string())
            .create_async()
            .await;

        let service = ClaudeService::new(Client::new(), server.url(), Some("ant-key".into()));
        let request = CompletionRequest::new("Hi", None, 1024).unwrap();

        let err = service
            .invoke("claude-3-haiku-20240307", &request)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(529));
        assert!(err.to_string().contains("Overloaded"));
    }
}
