//! Band legend and health handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use margin_core::{legend, BandLegendEntry};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub source: String,
}

/// GET /api/health - Liveness plus the dataset source in use
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        source: state.source.name(),
    })
}

/// GET /api/bands - Margin band legend, highest band first
pub async fn list_bands() -> Json<Vec<BandLegendEntry>> {
    Json(legend())
}
