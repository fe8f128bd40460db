//! Export command implementation

use std::path::Path;

use anyhow::{Context, Result};
use margin_core::{ExportBundle, ExportFormat, MarginConfig};

use super::{dataset_query, fetch_dataset};
use crate::cli::PeriodArgs;

/// Format from `--format`, falling back to the configured default
pub fn resolve_format(config: &MarginConfig, format: Option<&str>) -> Result<ExportFormat> {
    match format {
        Some(format) => format.parse().map_err(anyhow::Error::msg),
        None => Ok(config.export.format),
    }
}

pub async fn cmd_export(
    config: &MarginConfig,
    period: &PeriodArgs,
    format: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let format = resolve_format(config, format)?;
    let dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.export.dir.clone());

    let query = dataset_query(period)?;
    let dataset = fetch_dataset(config, &query).await?;
    let bundle = ExportBundle::from_dataset(&dataset, query.period);

    println!(
        "📤 Exporting {} items, {} customers, {} categories as {}...",
        bundle.top_items.len(),
        bundle.top_customers.len(),
        bundle.categories.len(),
        format
    );

    let written = format
        .sink(dir)
        .write(&bundle)
        .context("Failed to write export")?;

    for path in &written {
        println!("   ✓ {}", path.display());
    }
    Ok(())
}
