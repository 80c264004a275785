//! Configuration management module
//!
//! This module handles loading application configuration from environment
//! variables and .env files, and owns the static model catalog.

pub mod models;
pub mod settings;

pub use models::{default_catalog, ModelSpec, ProviderFamily};
pub use settings::{
    Environment, ProviderCredentials, Settings, UpstreamEndpoints, DEFAULT_MAX_OUTPUT_TOKENS,
};
