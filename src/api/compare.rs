//! Comparison endpoint
//!
//! POST /api with `{"prompt": "...", "jsonSchema": "<JSON-encoded schema>"}`
//! returns `{"<model>": <result>, ...}` in catalog order.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::server::state::AppState;
use crate::services::{CompareError, ComparisonResponse};

/// Request body for POST /api
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareBody {
    #[serde(default)]
    pub prompt: Option<String>,

    /// JSON Schema encoded as a string
    #[serde(default)]
    pub json_schema: Option<String>,
}

/// POST /api - fan the prompt out to every configured model
pub async fn compare(
    State(state): State<AppState>,
    payload: Result<Json<CompareBody>, JsonRejection>,
) -> Result<Json<ComparisonResponse>, ApiError> {
    let Json(body) =
        payload.map_err(|e| ApiError::InvalidRequest(format!("Invalid request body: {}", e)))?;

    let prompt = body
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::from(CompareError::EmptyPrompt))?;

    let schema = parse_schema(body.json_schema.as_deref())?;

    let response = state.comparison.compare(&prompt, schema).await?;

    Ok(Json(response))
}

/// Blank means "no schema"; anything else must parse as JSON.
fn parse_schema(raw: Option<&str>) -> Result<Option<serde_json::Value>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid jsonSchema: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_schema() {
        assert_eq!(parse_schema(None).unwrap(), None);
        assert_eq!(parse_schema(Some("   ")).unwrap(), None);
        assert_eq!(
            parse_schema(Some(r#"{"type":"object"}"#)).unwrap(),
            Some(json!({"type": "object"}))
        );

        let err = parse_schema(Some("{not json")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(ref m) if m.starts_with("Invalid jsonSchema:")));
    }

    #[test]
    fn test_body_field_names() {
        let body: CompareBody =
            serde_json::from_value(json!({"prompt": "Hi", "jsonSchema": "{}"})).unwrap();
        assert_eq!(body.prompt.as_deref(), Some("Hi"));
        assert_eq!(body.json_schema.as_deref(), Some("{}"));

        let body: CompareBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.prompt.is_none());
    }
}
