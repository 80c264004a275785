//! Anthropic Messages API schema definitions
//!
//! Request and response structures for `POST /v1/messages`, including the
//! forced single-tool form used to obtain schema-shaped output.

use serde::{Deserialize, Serialize};

/// Value of the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// Request Models
// ============================================================================

/// Anthropic Messages API request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl MessageRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Offer exactly one tool and require the model to call it.
    pub fn with_forced_tool(mut self, tool: Tool) -> Self {
        self.tool_choice = Some(ToolChoice::Tool {
            name: tool.name.clone(),
        });
        self.tools = Some(vec![tool]);
        self
    }
}

/// Single-turn message with plain text content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Tool definition. `input_schema` is whatever JSON Schema the caller gave.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Tool choice configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
    Any,
    Tool { name: String },
}

// ============================================================================
// Response Models
// ============================================================================

/// Messages API response, or an error envelope.
///
/// Both shapes share one struct so the adapter can classify any body
/// without a second parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub content: Option<Vec<ResponseBlock>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

/// A content block from the response.
///
/// `text` blocks carry `text` and `tool_use` blocks carry `input`. Unknown
/// block types still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseBlock {
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
}

// ============================================================================
// Error Response
// ============================================================================

/// Error detail structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type", default)]
    pub error_type: String,
    pub message: String,
}
