//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::ProviderFamily;
use crate::server::state::AppState;

/// Response for the health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
    pub providers: ProviderStatus,
}

/// Whether each family's credential is configured
#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub gemini: bool,
    pub chatgpt: bool,
    pub claude: bool,
}

/// GET /health
///
/// Reports "healthy" when every provider has a credential, "degraded"
/// otherwise (comparisons will be rejected until keys are set).
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = state.comparison.providers();
    let configured = |family| providers.get(family).is_configured();

    let status = ProviderStatus {
        gemini: configured(ProviderFamily::Gemini),
        chatgpt: configured(ProviderFamily::ChatGpt),
        claude: configured(ProviderFamily::Claude),
    };
    let healthy = status.gemini && status.chatgpt && status.claude;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
        providers: status,
    })
}
