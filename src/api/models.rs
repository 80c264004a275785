//! Model catalog endpoint
//!
//! GET /api/models lists the models every comparison queries, in the order
//! results come back. The UI builds its result cards from this.

use axum::{extract::State, Json};

use crate::config::ModelSpec;
use crate::server::state::AppState;

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelSpec>> {
    Json(state.comparison.catalog().to_vec())
}
