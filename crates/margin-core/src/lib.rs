//! Margin Lens Core Library
//!
//! Shared functionality for the margin analysis reporting engine:
//! - Data model for processed margin datasets
//! - Band classification, sorting, search and category filtering, top-N
//! - Standard / credit-memo adjusted view selection
//! - Tab composition controller and chart projection
//! - Export bundle and CSV / JSON sinks
//! - Dataset sources and a last-request-wins loader
//! - Built-in margin insights
//! - TOML configuration with embedded defaults

pub mod band;
pub mod chart;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod filter;
pub mod insights;
pub mod loader;
pub mod models;
pub mod sort;
pub mod source;
pub mod top_n;
pub mod view_mode;

pub use band::{classify, legend, Band, BandLegendEntry};
pub use chart::{project, ChartDatum, ChartSource, CHART_LIMIT};
pub use config::MarginConfig;
pub use controller::{
    BandedRow, ChartView, ComposedView, InsightsView, SummaryView, Tab, TabController, TabView,
    TableView, ViewParams,
};
pub use error::{Error, Result};
pub use export::{CsvExportSink, ExportBundle, ExportFormat, ExportSink, JsonExportSink};
pub use filter::{category_options, filter_by_category, filter_by_search, Searchable};
pub use insights::{Finding, Insight, InsightEngine, InsightType, InsightsInput, Severity};
pub use loader::{fetch_into, DatasetLoader, LoadOutcome, LoadState, RequestTicket};
pub use models::{
    CategoryMarginRecord, CustomerMarginRecord, DatasetScope, ItemMarginRecord, MarginRecord,
    OverallSummary, Period, ProcessedMarginDataset, RecordKind,
};
pub use sort::{sort_records, SortDirection, SortField, SortState, Sortable};
pub use source::{
    open_source, DatasetQuery, DatasetSource, FileDatasetSource, HttpDatasetSource,
    InMemorySource,
};
pub use top_n::{truncate, TopN};
pub use view_mode::{active_customers, active_items, active_overall, OverallView, ViewMode};
