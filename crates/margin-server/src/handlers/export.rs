//! Export handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Response, StatusCode},
};
use serde::Deserialize;
use tracing::info;

use super::margin::{load_dataset, ScopeQuery};
use crate::{AppError, AppState};
use margin_core::{export::items_csv, ExportBundle, ExportFormat};

/// Query parameters for a period export
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Output format (defaults to the configured export format)
    pub format: Option<String>,
}

/// GET /api/margin/:year/:month/export - Gross arrays as JSON, or items as CSV
///
/// Exports ignore every view selection: they always carry the full standard
/// arrays for the period.
pub async fn export_period(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
    Query(params): Query<ExportQuery>,
    Query(scope): Query<ScopeQuery>,
) -> Result<Response<Body>, AppError> {
    let format = match params.format.as_deref() {
        Some(format) => format
            .parse::<ExportFormat>()
            .map_err(|_| AppError::bad_request("Invalid format. Use 'csv' or 'json'"))?,
        None => state.config.export.format,
    };

    let (period, dataset) = load_dataset(&state, year, month, scope).await?;
    let bundle = ExportBundle::from_dataset(&dataset, period);

    match format {
        ExportFormat::Csv => {
            let csv = items_csv(&bundle.top_items)?;
            info!("Exported {} items to CSV", bundle.top_items.len());

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}-items.csv\"", bundle.filename_hint),
                )
                .body(Body::from(csv))
                .map_err(|e| AppError::internal(&e.to_string()))
        }
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(&bundle)
                .map_err(|e| AppError::internal(&e.to_string()))?;
            info!(
                "Exported {} items, {} customers, {} categories to JSON",
                bundle.top_items.len(),
                bundle.top_customers.len(),
                bundle.categories.len()
            );

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.json\"", bundle.filename_hint),
                )
                .body(Body::from(json))
                .map_err(|e| AppError::internal(&e.to_string()))
        }
    }
}
