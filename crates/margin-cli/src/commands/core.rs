//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve configuration and the dataset source
//! - `resolve_period` - Turn --year/--month into a validated period
//! - `fetch_dataset` - Load the dataset for a period from the configured source

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use margin_core::{DatasetQuery, DatasetScope, MarginConfig, Period, ProcessedMarginDataset};

use crate::cli::PeriodArgs;

/// Load config (explicit path, data-dir override or defaults) and apply
/// environment and `--source` overrides, in that order
pub fn load_config(path: Option<&Path>, source: Option<&str>) -> Result<MarginConfig> {
    let config = MarginConfig::load(path).context("Failed to load configuration")?;
    Ok(apply_source(config.with_env_overrides(), source))
}

/// `--source` wins over both the service URL and the data directory
pub fn apply_source(mut config: MarginConfig, source: Option<&str>) -> MarginConfig {
    if let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) {
        if source.starts_with("http://") || source.starts_with("https://") {
            config.service.base_url = source.to_string();
            config.service.data_dir = None;
        } else {
            config.service.data_dir = Some(PathBuf::from(source));
        }
    }
    config
}

/// Validated period, defaulting missing parts to the current month
pub fn resolve_period(year: Option<i32>, month: Option<u32>) -> Result<Period> {
    let current = Period::current();
    let period = Period::new(
        year.unwrap_or_else(|| current.year()),
        month.unwrap_or_else(|| current.month()),
    )?;
    Ok(period)
}

pub fn dataset_query(args: &PeriodArgs) -> Result<DatasetQuery> {
    let period = resolve_period(args.year, args.month)?;
    Ok(DatasetQuery::new(period).with_scope(DatasetScope {
        category: args.scope_category.clone(),
        salesperson: args.salesperson.clone(),
    }))
}

pub async fn fetch_dataset(
    config: &MarginConfig,
    query: &DatasetQuery,
) -> Result<ProcessedMarginDataset> {
    let source = config
        .open_source()
        .context("Failed to open dataset source")?;
    tracing::debug!(source = %source.name(), period = %query.period, "Fetching dataset");

    source
        .fetch(query)
        .await
        .with_context(|| format!("Failed to load margin data for {}", query.period))
}
