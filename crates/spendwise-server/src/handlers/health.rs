//! Liveness endpoint

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use spendwise_core::ai::BackendInfo;

/// Response for GET /api/health
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// External classifier, if one is configured
    pub classifier: Option<BackendInfo>,
    pub heuristic_fallback: bool,
    pub cached_classifications: usize,
}

/// GET /api/health - Liveness and classifier configuration
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let classifier = state.service.classifier();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        classifier: classifier.external().map(|c| c.info()),
        heuristic_fallback: classifier.config().heuristic_fallback,
        cached_classifications: classifier.cache().len(),
    })
}
