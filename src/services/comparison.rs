//! Fan-out orchestrator
//!
//! Sends one prompt to every model in the catalog at once and assembles
//! the answers in catalog order. The batch is all-or-nothing: the first
//! adapter failure fails the whole comparison and in-flight siblings are
//! dropped.

use futures::future::try_join_all;
use reqwest::Client;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ModelSpec, ProviderFamily, Settings};
use crate::services::{
    ChatGptService, ClaudeService, CompletionProvider, CompletionRequest, GeminiService,
    ModelResult, ProviderError,
};

// ============================================================================
// Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("No prompt provided")]
    EmptyPrompt,

    #[error("One or more API keys are missing: {}", family_list(.0))]
    MissingCredentials(Vec<ProviderFamily>),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn family_list(families: &[ProviderFamily]) -> String {
    families
        .iter()
        .map(|f| f.credential_var())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Comparison Response
// ============================================================================

/// Model identifier → result, in catalog order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonResponse {
    entries: Vec<(String, ModelResult)>,
}

impl ComparisonResponse {
    pub fn from_entries(entries: Vec<(String, ModelResult)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, model: &str) -> Option<&ModelResult> {
        self.entries
            .iter()
            .find(|(key, _)| key == model)
            .map(|(_, result)| result)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelResult)> {
        self.entries.iter().map(|(key, result)| (key.as_str(), result))
    }
}

impl Serialize for ComparisonResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (model, result) in &self.entries {
            map.serialize_entry(model, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ComparisonResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = ComparisonResponse;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of model identifiers to results")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((model, result)) = access.next_entry::<String, ModelResult>()? {
                    entries.push((model, result));
                }
                Ok(ComparisonResponse { entries })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

// ============================================================================
// Provider Set
// ============================================================================

/// One adapter per provider family
#[derive(Clone)]
pub struct Providers {
    gemini: Arc<dyn CompletionProvider>,
    chatgpt: Arc<dyn CompletionProvider>,
    claude: Arc<dyn CompletionProvider>,
}

impl Providers {
    pub fn new(
        gemini: Arc<dyn CompletionProvider>,
        chatgpt: Arc<dyn CompletionProvider>,
        claude: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            gemini,
            chatgpt,
            claude,
        }
    }

    /// Build the real HTTP adapters from settings, sharing one client
    pub fn from_settings(settings: &Settings) -> reqwest::Result<Self> {
        let client: Client = super::build_http_client(settings.upstream_timeout())?;
        let credentials = &settings.credentials;
        let endpoints = &settings.endpoints;

        Ok(Self::new(
            Arc::new(GeminiService::new(
                client.clone(),
                endpoints.gemini.as_str(),
                credentials.gemini.clone(),
            )),
            Arc::new(ChatGptService::new(
                client.clone(),
                endpoints.openai.as_str(),
                credentials.openai.clone(),
            )),
            Arc::new(ClaudeService::new(
                client,
                endpoints.anthropic.as_str(),
                credentials.anthropic.clone(),
            )),
        ))
    }

    pub fn get(&self, family: ProviderFamily) -> &Arc<dyn CompletionProvider> {
        match family {
            ProviderFamily::Gemini => &self.gemini,
            ProviderFamily::ChatGpt => &self.chatgpt,
            ProviderFamily::Claude => &self.claude,
        }
    }

    /// Families whose credential is absent
    pub fn missing(&self) -> Vec<ProviderFamily> {
        ProviderFamily::ALL
            .into_iter()
            .filter(|family| !self.get(*family).is_configured())
            .collect()
    }
}

// ============================================================================
// Comparison Service
// ============================================================================

pub struct ComparisonService {
    providers: Providers,
    catalog: Vec<ModelSpec>,
    max_output_tokens: u32,
    print_prompts: bool,
}

impl ComparisonService {
    pub fn new(providers: Providers, catalog: Vec<ModelSpec>, max_output_tokens: u32) -> Self {
        Self {
            providers,
            catalog,
            max_output_tokens,
            print_prompts: false,
        }
    }

    /// Log prompt text on every comparison
    pub fn with_print_prompts(mut self, print_prompts: bool) -> Self {
        self.print_prompts = print_prompts;
        self
    }

    pub fn catalog(&self) -> &[ModelSpec] {
        &self.catalog
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Query every catalog model concurrently.
    ///
    /// Fails before any upstream call when the prompt is blank or a
    /// credential is missing.
    pub async fn compare(
        &self,
        prompt: &str,
        json_schema: Option<serde_json::Value>,
    ) -> Result<ComparisonResponse, CompareError> {
        let request = CompletionRequest::new(prompt, json_schema, self.max_output_tokens)
            .ok_or(CompareError::EmptyPrompt)?;

        if self.print_prompts {
            tracing::info!(prompt = %request.prompt(), "Received prompt");
        } else {
            tracing::info!(
                prompt_chars = request.prompt().chars().count(),
                structured = request.json_schema().is_some(),
                "Received prompt"
            );
        }

        let missing = self.providers.missing();
        if !missing.is_empty() {
            return Err(CompareError::MissingCredentials(missing));
        }

        let request = &request;
        let calls = self.catalog.iter().map(|spec| {
            let provider = self.providers.get(spec.family);
            async move {
                provider
                    .invoke(&spec.model, request)
                    .await
                    .map(|result| (spec.model.clone(), result))
            }
        });

        let entries = try_join_all(calls).await?;

        tracing::info!(models = entries.len(), "API responses received");

        Ok(ComparisonResponse::from_entries(entries))
    }
}

// ============================================================================
// Tests
// ============================================================================
