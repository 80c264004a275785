//! Application settings and configuration
//!
//! Settings are read once at startup from environment variables (and an
//! optional `.env` file) and shared read-only for the lifetime of the process.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::time::Duration;

use crate::config::models::ProviderFamily;

/// Output-token budget used when `MAX_OUTPUT_TOKENS` is unset or unusable
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";

/// Application environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => anyhow::bail!(
                "Invalid environment: {}. Expected: development, staging, or production",
                s
            ),
        }
    }
}

/// One secret per provider family. Never serialized.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub gemini: Option<String>,
    pub openai: Option<String>,
    pub anthropic: Option<String>,
}

impl ProviderCredentials {
    pub fn get(&self, family: ProviderFamily) -> Option<&str> {
        let key = match family {
            ProviderFamily::Gemini => &self.gemini,
            ProviderFamily::ChatGpt => &self.openai,
            ProviderFamily::Claude => &self.anthropic,
        };
        key.as_deref()
    }

    pub fn missing(&self) -> Vec<ProviderFamily> {
        ProviderFamily::ALL
            .into_iter()
            .filter(|family| self.get(*family).is_none())
            .collect()
    }
}

// Keep keys out of Debug output (and therefore out of logs).
impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("gemini", &self.gemini.as_ref().map(|_| "***"))
            .field("openai", &self.openai.as_ref().map(|_| "***"))
            .field("anthropic", &self.anthropic.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Upstream base URLs (overridable for proxies and tests)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamEndpoints {
    pub gemini: String,
    pub openai: String,
    pub anthropic: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            gemini: DEFAULT_GEMINI_API_BASE.to_string(),
            openai: DEFAULT_OPENAI_API_BASE.to_string(),
            anthropic: DEFAULT_ANTHROPIC_API_BASE.to_string(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,

    // Server settings
    pub host: String,
    pub port: u16,

    #[serde(skip)]
    pub credentials: ProviderCredentials,

    pub endpoints: UpstreamEndpoints,

    /// Output-token budget sent to every provider
    pub max_output_tokens: u32,

    /// Optional per-call upstream timeout; `None` waits indefinitely
    pub upstream_timeout_seconds: Option<u64>,

    /// Include the prompt text in request logs
    #[serde(default)]
    pub print_prompts: bool,
}

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let settings = Self {
            app_name: or_default("APP_NAME", "llm-comparison"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: or_default("ENVIRONMENT", "development")
                .parse()
                .unwrap_or_default(),
            log_level: or_default("LOG_LEVEL", "info"),

            host: or_default("HOST", "0.0.0.0"),
            port: or_default("PORT", "8787")
                .parse()
                .context("Invalid PORT value")?,

            credentials: ProviderCredentials {
                gemini: secret("GEMINI_API_KEY"),
                openai: secret("OPENAI_API_KEY"),
                anthropic: secret("ANTHROPIC_API_KEY"),
            },

            endpoints: UpstreamEndpoints {
                gemini: or_default("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
                openai: or_default("OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
                anthropic: or_default("ANTHROPIC_API_BASE", DEFAULT_ANTHROPIC_API_BASE),
            },

            max_output_tokens: parse_token_budget(lookup("MAX_OUTPUT_TOKENS").as_deref()),

            upstream_timeout_seconds: lookup("UPSTREAM_TIMEOUT_SECONDS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0),

            print_prompts: or_default("PRINT_PROMPTS", "false")
                .parse()
                .unwrap_or(false),
        };

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        Ok(())
    }

    /// Warn about settings that let the server start but will hurt later.
    /// Call once the tracing subscriber is installed.
    pub fn log_warnings(&self) {
        for family in self.credentials.missing() {
            tracing::warn!(
                provider = %family,
                variable = family.credential_var(),
                "API key not set, comparisons will fail until it is configured"
            );
        }

        if self.environment == Environment::Production && self.upstream_timeout_seconds.is_none() {
            tracing::warn!("Running in production without an upstream timeout");
        }
    }

    /// Per-call upstream timeout, if configured
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_seconds.map(Duration::from_secs)
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "llm-comparison".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8787,
            credentials: ProviderCredentials::default(),
            endpoints: UpstreamEndpoints::default(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            upstream_timeout_seconds: None,
            print_prompts: false,
        }
    }
}

/// Unset, non-numeric and zero budgets all fall back to the default.
fn parse_token_budget(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
}
