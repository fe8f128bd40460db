//! Margin analysis view handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::{AppError, AppState};
use margin_core::{
    category_options, ComposedView, DatasetQuery, DatasetScope, Period, ProcessedMarginDataset,
    ViewParams,
};

/// Dataset scope forwarded to the aggregation service
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub scope_category: Option<String>,
    pub salesperson: Option<String>,
}

/// Fetch the dataset for `/:year/:month`, validating the period first
pub(crate) async fn load_dataset(
    state: &AppState,
    year: i32,
    month: u32,
    scope: ScopeQuery,
) -> Result<(Period, ProcessedMarginDataset), AppError> {
    let period = Period::new(year, month)?;
    let query = DatasetQuery::new(period).with_scope(DatasetScope {
        category: scope.scope_category,
        salesperson: scope.salesperson,
    });

    debug!(source = %state.source.name(), period = %period, "Fetching dataset");
    let dataset = state.source.fetch(&query).await?;
    Ok((period, dataset))
}

/// GET /api/margin/:year/:month/view - Compose one tab of the analysis
///
/// Query parameters mirror the controller selections: `tab`, `mode`,
/// `search`, `category`, `top_n`, `sort`, `direction` and `chart_of`.
pub async fn get_view(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
    Query(params): Query<ViewParams>,
    Query(scope): Query<ScopeQuery>,
) -> Result<Json<ComposedView>, AppError> {
    let mut controller = state.config.controller();
    params.apply(&mut controller)?;

    let (_, dataset) = load_dataset(&state, year, month, scope).await?;
    let view = controller.compose_with(Some(&dataset), false, Some(&state.engine));
    Ok(Json(view))
}

/// GET /api/margin/:year/:month/categories - Category filter options
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
    Query(scope): Query<ScopeQuery>,
) -> Result<Json<Vec<String>>, AppError> {
    let (_, dataset) = load_dataset(&state, year, month, scope).await?;
    Ok(Json(category_options(&dataset.categories)))
}
