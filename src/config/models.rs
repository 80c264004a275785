//! Model catalog
//!
//! The ordered list of models queried on every comparison. Both the
//! orchestrator and the `/api/models` endpoint read from here, so the UI
//! can never display a model that is not queried (or miss one that is).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream LLM vendor family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    Gemini,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Claude,
}

impl ProviderFamily {
    pub const ALL: [ProviderFamily; 3] = [
        ProviderFamily::Gemini,
        ProviderFamily::ChatGpt,
        ProviderFamily::Claude,
    ];

    /// Environment variable holding this family's API key
    pub fn credential_var(&self) -> &'static str {
        match self {
            ProviderFamily::Gemini => "GEMINI_API_KEY",
            ProviderFamily::ChatGpt => "OPENAI_API_KEY",
            ProviderFamily::Claude => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFamily::Gemini => write!(f, "Gemini"),
            ProviderFamily::ChatGpt => write!(f, "ChatGPT"),
            ProviderFamily::Claude => write!(f, "Claude"),
        }
    }
}

/// A single model queried by the comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(rename = "provider")]
    pub family: ProviderFamily,
    #[serde(rename = "id")]
    pub model: String,
}

impl ModelSpec {
    pub fn new(family: ProviderFamily, model: impl Into<String>) -> Self {
        Self {
            family,
            model: model.into(),
        }
    }
}

const CATALOG: [(ProviderFamily, &str); 8] = [
    (ProviderFamily::Gemini, "gemini-1.5-flash"),
    (ProviderFamily::Gemini, "gemini-1.5-pro"),
    (ProviderFamily::ChatGpt, "gpt-4o-mini"),
    (ProviderFamily::ChatGpt, "gpt-4o"),
    (ProviderFamily::ChatGpt, "gpt-4o-2024-08-06"),
    (ProviderFamily::Claude, "claude-3-haiku-20240307"),
    (ProviderFamily::Claude, "claude-3-5-sonnet-20240620"),
    (ProviderFamily::Claude, "claude-3-opus-20240229"),
];

/// The default catalog, in the order results are reported
pub fn default_catalog() -> Vec<ModelSpec> {
    CATALOG
        .iter()
        .map(|(family, model)| ModelSpec::new(*family, *model))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_spans_all_families() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 8);

        let families: HashSet<_> = catalog.iter().map(|m| m.family).collect();
        assert_eq!(families.len(), ProviderFamily::ALL.len());
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = default_catalog();
        let ids: HashSet<_> = catalog.iter().map(|m| m.model.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_model_spec_serialization() {
        let spec = ModelSpec::new(ProviderFamily::ChatGpt, "gpt-4o");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, serde_json::json!({"provider": "chatgpt", "id": "gpt-4o"}));
    }
}
