//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use clap::Parser;
use margin_core::{
    CategoryMarginRecord, CustomerMarginRecord, ExportFormat, ItemMarginRecord, MarginConfig,
    OverallSummary, ProcessedMarginDataset, Tab, TopN, ViewMode, ViewParams,
};
use tempfile::TempDir;

use crate::cli::{Cli, Commands, PeriodArgs};
use crate::commands::{self, truncate};

fn march_2024() -> PeriodArgs {
    PeriodArgs {
        year: Some(2024),
        month: Some(3),
        scope_category: None,
        salesperson: None,
    }
}

fn sample_dataset() -> ProcessedMarginDataset {
    ProcessedMarginDataset {
        overall: Some(OverallSummary::new(1000.0, 750.0)),
        top_items: vec![
            ItemMarginRecord::new("B100", "Bolt", 10.0, 200.0, 120.0).with_posting_group("HW"),
            ItemMarginRecord::new("N200", "Nut", 5.0, 100.0, 95.0).with_posting_group("HW"),
        ],
        top_customers: vec![CustomerMarginRecord::new("C1", "Acme Corp", 15.0, 300.0, 215.0)],
        categories: vec![
            CategoryMarginRecord::new("HW", 15.0, 300.0, 215.0).with_description("Hardware"),
        ],
        adjusted_items: None,
        adjusted_customers: None,
    }
}

/// Data directory holding the March 2024 dataset, plus a config pointing at it
fn setup_file_source() -> (TempDir, MarginConfig) {
    let dir = TempDir::new().unwrap();
    let json = serde_json::to_string(&sample_dataset()).unwrap();
    std::fs::write(dir.path().join("2024-03.json"), json).unwrap();

    let mut config = MarginConfig::default();
    config.service.data_dir = Some(dir.path().to_path_buf());
    config.export.dir = dir.path().join("exports");
    (dir, config)
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_view_command() {
    let cli = Cli::try_parse_from([
        "margin", "view", "--year", "2024", "--month", "3", "--tab", "items", "--top", "5",
        "--sort", "margin", "--json",
    ])
    .unwrap();

    match cli.command {
        Commands::View {
            period,
            tab,
            top,
            sort,
            json,
            ..
        } => {
            assert_eq!(period.year, Some(2024));
            assert_eq!(period.month, Some(3));
            assert_eq!(tab.as_deref(), Some("items"));
            assert_eq!(top.as_deref(), Some("5"));
            assert_eq!(sort.as_deref(), Some("margin"));
            assert!(json);
        }
        _ => panic!("expected view command"),
    }
}

#[test]
fn test_parse_global_source_after_subcommand() {
    let cli = Cli::try_parse_from(["margin", "bands", "--source", "/srv/margins", "-v"]).unwrap();
    assert_eq!(cli.source.as_deref(), Some("/srv/margins"));
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::Bands));
}

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["margin", "serve"]).unwrap();
    match cli.command {
        Commands::Serve { port, host } => {
            assert_eq!(port, 3000);
            assert_eq!(host, "127.0.0.1");
        }
        _ => panic!("expected serve command"),
    }
}

#[test]
fn test_parse_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["margin", "reconcile"]).is_err());
}

// ========== Core Utility Tests ==========

#[test]
fn test_resolve_period_explicit() {
    let period = commands::resolve_period(Some(2023), Some(12)).unwrap();
    assert_eq!(period.year(), 2023);
    assert_eq!(period.month(), 12);
}

#[test]
fn test_resolve_period_rejects_bad_month() {
    assert!(commands::resolve_period(Some(2024), Some(13)).is_err());
    assert!(commands::resolve_period(Some(2024), Some(0)).is_err());
}

#[test]
fn test_resolve_period_defaults_to_current() {
    let current = margin_core::Period::current();
    let period = commands::resolve_period(None, None).unwrap();
    assert_eq!(period, current);
}

#[test]
fn test_dataset_query_carries_scope() {
    let mut args = march_2024();
    args.salesperson = Some("JD".to_string());
    let query = commands::dataset_query(&args).unwrap();
    assert_eq!(query.period.to_string(), "2024-03");
    assert_eq!(query.scope.salesperson.as_deref(), Some("JD"));
    assert!(query.scope.category.is_none());
}

#[test]
fn test_apply_source_url() {
    let mut config = MarginConfig::default();
    config.service.data_dir = Some("/tmp/margins".into());

    let config = commands::apply_source(config, Some("https://margins.example.com/api"));
    assert_eq!(config.service.base_url, "https://margins.example.com/api");
    assert!(config.service.data_dir.is_none());
}

#[test]
fn test_apply_source_directory() {
    let config = commands::apply_source(MarginConfig::default(), Some("/srv/margins"));
    assert_eq!(config.source_location(), "/srv/margins");
}

#[test]
fn test_apply_source_blank_is_ignored() {
    let before = MarginConfig::default();
    let after = commands::apply_source(before.clone(), Some("  "));
    assert_eq!(before, after);
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a long string that exceeds", 10), "a long ...");
    assert_eq!(truncate("exact", 5), "exact");
    assert_eq!(truncate("toolong", 6), "too...");
    // Multi-byte names are cut on character boundaries
    assert_eq!(truncate("Ünïcödé Wïdgét", 8), "Ünïcö...");
}

#[test]
fn test_resolve_export_format() {
    let config = MarginConfig::default();
    assert_eq!(
        commands::resolve_format(&config, Some("json")).unwrap(),
        ExportFormat::Json
    );
    assert_eq!(
        commands::resolve_format(&config, None).unwrap(),
        config.export.format
    );
    assert!(commands::resolve_format(&config, Some("xlsx")).is_err());
}

// ========== View Command Tests ==========

#[test]
fn test_build_controller_applies_params() {
    let params = ViewParams {
        tab: Some("customers".to_string()),
        mode: Some("adjusted".to_string()),
        top_n: Some("5".to_string()),
        ..Default::default()
    };
    let controller = commands::build_controller(&MarginConfig::default(), &params).unwrap();
    assert_eq!(controller.active_tab(), Tab::Customers);
    assert_eq!(controller.view_mode(), ViewMode::Adjusted);
    assert_eq!(controller.top_n(), TopN::Limit(5));
}

#[test]
fn test_build_controller_rejects_unknown_tab() {
    let params = ViewParams {
        tab: Some("ledger".to_string()),
        ..Default::default()
    };
    assert!(commands::build_controller(&MarginConfig::default(), &params).is_err());
}

#[tokio::test]
async fn test_cmd_view_every_tab() {
    let (_dir, config) = setup_file_source();
    for tab in Tab::ALL {
        let params = ViewParams {
            tab: Some(tab.to_string()),
            ..Default::default()
        };
        let result = commands::cmd_view(&config, &march_2024(), &params, false).await;
        assert!(result.is_ok(), "tab {} failed: {:?}", tab, result.err());
    }
}

#[tokio::test]
async fn test_cmd_view_json() {
    let (_dir, config) = setup_file_source();
    let params = ViewParams {
        tab: Some("items".to_string()),
        search: Some("bolt".to_string()),
        ..Default::default()
    };
    let result = commands::cmd_view(&config, &march_2024(), &params, true).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_view_missing_period_fails() {
    let (_dir, config) = setup_file_source();
    let mut period = march_2024();
    period.month = Some(4);
    let result = commands::cmd_view(&config, &period, &ViewParams::default(), false).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_categories() {
    let (_dir, config) = setup_file_source();
    let result = commands::cmd_categories(&config, &march_2024()).await;
    assert!(result.is_ok());
}

#[test]
fn test_cmd_bands() {
    assert!(commands::cmd_bands().is_ok());
}

// ========== Export Command Tests ==========

#[tokio::test]
async fn test_cmd_export_csv_to_configured_dir() {
    let (dir, config) = setup_file_source();
    commands::cmd_export(&config, &march_2024(), Some("csv"), None)
        .await
        .unwrap();

    let exports = dir.path().join("exports");
    for sheet in ["items", "customers", "categories"] {
        let path = exports.join(format!("margin-analysis-March-2024-{}.csv", sheet));
        assert!(path.exists(), "missing {}", path.display());
    }
}

#[tokio::test]
async fn test_cmd_export_json_to_output_dir() {
    let (dir, config) = setup_file_source();
    let output = dir.path().join("out");
    commands::cmd_export(&config, &march_2024(), Some("json"), Some(&output))
        .await
        .unwrap();

    let content =
        std::fs::read_to_string(output.join("margin-analysis-March-2024.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["topItems"].as_array().unwrap().len(), 2);
    assert_eq!(value["categories"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cmd_export_bad_format() {
    let (_dir, config) = setup_file_source();
    let result = commands::cmd_export(&config, &march_2024(), Some("xlsx"), None).await;
    assert!(result.is_err());
}
