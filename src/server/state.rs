//! Application state container
//!
//! Shared state handed to every request handler through Axum's state
//! extraction. Everything in here is read-only after startup.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{default_catalog, Settings};
use crate::services::{ComparisonService, Providers};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Fan-out orchestrator over the model catalog
    pub comparison: Arc<ComparisonService>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Build the real provider adapters from settings
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        tracing::debug!(
            upstream_timeout = ?settings.upstream_timeout(),
            max_output_tokens = settings.max_output_tokens,
            "Initializing provider adapters"
        );

        let providers = Providers::from_settings(&settings)?;
        let comparison = ComparisonService::new(
            providers,
            default_catalog(),
            settings.max_output_tokens,
        )
        .with_print_prompts(settings.print_prompts);

        tracing::info!(
            models = comparison.catalog().len(),
            "Application state initialized successfully"
        );

        Ok(Self::with_service(settings, comparison))
    }

    /// Assemble state around an existing orchestrator
    pub fn with_service(settings: Settings, comparison: ComparisonService) -> Self {
        Self {
            settings: Arc::new(settings),
            comparison: Arc::new(comparison),
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
