//! Export of the raw gross arrays for a period
//!
//! The bundle always carries the standard `topItems`, `topCustomers` and
//! `categories` arrays, independent of view mode, search or top-N. Sinks
//! decide how the bundle lands on disk:
//! - CSV: one file per sheet in a directory
//! - JSON: a single file with the three named arrays

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{
    CategoryMarginRecord, CustomerMarginRecord, ItemMarginRecord, Period, ProcessedMarginDataset,
};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Sink writing this format into `dir`
    pub fn sink(&self, dir: impl Into<PathBuf>) -> Box<dyn ExportSink> {
        match self {
            ExportFormat::Csv => Box::new(CsvExportSink::new(dir)),
            ExportFormat::Json => Box::new(JsonExportSink::new(dir)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown export format: {} (expected csv or json)", s)),
        }
    }
}

/// What the export adapter receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub top_items: Vec<ItemMarginRecord>,
    pub top_customers: Vec<CustomerMarginRecord>,
    pub categories: Vec<CategoryMarginRecord>,
    /// Base filename, e.g. `margin-analysis-March-2024`
    pub filename_hint: String,
}

impl ExportBundle {
    /// Gross arrays of `dataset`; adjusted arrays are never exported
    pub fn from_dataset(dataset: &ProcessedMarginDataset, period: Period) -> Self {
        Self {
            top_items: dataset.top_items.clone(),
            top_customers: dataset.top_customers.clone(),
            categories: dataset.categories.clone(),
            filename_hint: filename_hint(period),
        }
    }
}

/// `margin-analysis-<MonthName>-<year>`
pub fn filename_hint(period: Period) -> String {
    format!("margin-analysis-{}-{}", period.month_name(), period.year())
}

/// Destination for an export bundle
pub trait ExportSink: Send + Sync {
    /// Write the bundle, returning the files created
    fn write(&self, bundle: &ExportBundle) -> Result<Vec<PathBuf>>;

    fn format(&self) -> ExportFormat;
}

// CSV rows are flat and always carry every column so the header stays fixed.
// The header is written up front, so an empty sheet still has one.

trait SheetRow: Serialize {
    const HEADER: &'static [&'static str];
}

#[derive(Debug, Serialize)]
struct ItemRow<'a> {
    item_code: &'a str,
    description: &'a str,
    posting_group: &'a str,
    vendor_code: &'a str,
    vendor_name: &'a str,
    total_quantity: f64,
    total_sales: f64,
    total_cost: f64,
    margin: f64,
    margin_percent: f64,
}

impl SheetRow for ItemRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "item_code",
        "description",
        "posting_group",
        "vendor_code",
        "vendor_name",
        "total_quantity",
        "total_sales",
        "total_cost",
        "margin",
        "margin_percent",
    ];
}

impl<'a> From<&'a ItemMarginRecord> for ItemRow<'a> {
    fn from(r: &'a ItemMarginRecord) -> Self {
        Self {
            item_code: &r.item_code,
            description: &r.description,
            posting_group: r.posting_group.as_deref().unwrap_or(""),
            vendor_code: r.vendor_code.as_deref().unwrap_or(""),
            vendor_name: r.vendor_name.as_deref().unwrap_or(""),
            total_quantity: r.total_quantity,
            total_sales: r.total_sales,
            total_cost: r.total_cost,
            margin: r.margin,
            margin_percent: r.margin_percent,
        }
    }
}

#[derive(Debug, Serialize)]
struct CustomerRow<'a> {
    customer_code: &'a str,
    customer_name: &'a str,
    search_name: &'a str,
    total_quantity: f64,
    total_sales: f64,
    total_cost: f64,
    margin: f64,
    margin_percent: f64,
}

impl SheetRow for CustomerRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "customer_code",
        "customer_name",
        "search_name",
        "total_quantity",
        "total_sales",
        "total_cost",
        "margin",
        "margin_percent",
    ];
}

impl<'a> From<&'a CustomerMarginRecord> for CustomerRow<'a> {
    fn from(r: &'a CustomerMarginRecord) -> Self {
        Self {
            customer_code: &r.customer_code,
            customer_name: &r.customer_name,
            search_name: r.search_name.as_deref().unwrap_or(""),
            total_quantity: r.total_quantity,
            total_sales: r.total_sales,
            total_cost: r.total_cost,
            margin: r.margin,
            margin_percent: r.margin_percent,
        }
    }
}

#[derive(Debug, Serialize)]
struct CategoryRow<'a> {
    posting_group: &'a str,
    category_description: &'a str,
    total_quantity: f64,
    total_sales: f64,
    total_cost: f64,
    margin: f64,
    margin_percent: f64,
}

impl SheetRow for CategoryRow<'_> {
    const HEADER: &'static [&'static str] = &[
        "posting_group",
        "category_description",
        "total_quantity",
        "total_sales",
        "total_cost",
        "margin",
        "margin_percent",
    ];
}

impl<'a> From<&'a CategoryMarginRecord> for CategoryRow<'a> {
    fn from(r: &'a CategoryMarginRecord) -> Self {
        Self {
            posting_group: &r.posting_group,
            category_description: r.category_description.as_deref().unwrap_or(""),
            total_quantity: r.total_quantity,
            total_sales: r.total_sales,
            total_cost: r.total_cost,
            margin: r.margin,
            margin_percent: r.margin_percent,
        }
    }
}

fn write_rows<W: Write, R: SheetRow>(writer: W, rows: impl IntoIterator<Item = R>) -> Result<W> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(R::HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}

fn csv_string<R: SheetRow>(rows: impl IntoIterator<Item = R>) -> Result<String> {
    let bytes = write_rows(Vec::new(), rows)?;
    String::from_utf8(bytes).map_err(|e| Error::Io(std::io::Error::other(e)))
}

/// Items sheet as CSV text
pub fn items_csv(items: &[ItemMarginRecord]) -> Result<String> {
    csv_string(items.iter().map(ItemRow::from))
}

/// Customers sheet as CSV text
pub fn customers_csv(customers: &[CustomerMarginRecord]) -> Result<String> {
    csv_string(customers.iter().map(CustomerRow::from))
}

/// Categories sheet as CSV text
pub fn categories_csv(categories: &[CategoryMarginRecord]) -> Result<String> {
    csv_string(categories.iter().map(CategoryRow::from))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Writes `<hint>-items.csv`, `<hint>-customers.csv` and `<hint>-categories.csv`
pub struct CsvExportSink {
    dir: PathBuf,
}

impl CsvExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn sheet_path(&self, bundle: &ExportBundle, sheet: &str) -> PathBuf {
        self.dir.join(format!("{}-{}.csv", bundle.filename_hint, sheet))
    }
}

impl ExportSink for CsvExportSink {
    fn write(&self, bundle: &ExportBundle) -> Result<Vec<PathBuf>> {
        ensure_dir(&self.dir)?;

        let items = self.sheet_path(bundle, "items");
        write_rows(fs::File::create(&items)?, bundle.top_items.iter().map(ItemRow::from))?;

        let customers = self.sheet_path(bundle, "customers");
        write_rows(
            fs::File::create(&customers)?,
            bundle.top_customers.iter().map(CustomerRow::from),
        )?;

        let categories = self.sheet_path(bundle, "categories");
        write_rows(
            fs::File::create(&categories)?,
            bundle.categories.iter().map(CategoryRow::from),
        )?;

        tracing::info!(
            dir = %self.dir.display(),
            items = bundle.top_items.len(),
            customers = bundle.top_customers.len(),
            categories = bundle.categories.len(),
            "Wrote CSV export"
        );

        Ok(vec![items, customers, categories])
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

/// Writes `<hint>.json` with the three named arrays
pub struct JsonExportSink {
    dir: PathBuf,
}

impl JsonExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for JsonExportSink {
    fn write(&self, bundle: &ExportBundle) -> Result<Vec<PathBuf>> {
        ensure_dir(&self.dir)?;

        let path = self.dir.join(format!("{}.json", bundle.filename_hint));
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, bundle)?;

        tracing::info!(path = %path.display(), "Wrote JSON export");

        Ok(vec![path])
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dataset() -> ProcessedMarginDataset {
        ProcessedMarginDataset {
            top_items: vec![
                ItemMarginRecord::new("X1", "Bolt, hex", 10.0, 100.0, 70.0)
                    .with_posting_group("HW"),
                ItemMarginRecord::new("X2", "Nut", 5.0, 50.0, 45.0),
            ],
            top_customers: vec![
                CustomerMarginRecord::new("C1", "Acme", 1.0, 150.0, 115.0).with_search_name("ACME")
            ],
            categories: vec![CategoryMarginRecord::new("HW", 15.0, 150.0, 115.0)],
            adjusted_items: Some(vec![ItemMarginRecord::new("ADJ", "Adjusted", 1.0, 1.0, 1.0)]),
            ..Default::default()
        }
    }

    fn period() -> Period {
        Period::new(2024, 3).unwrap()
    }

    #[test]
    fn test_bundle_uses_gross_arrays() {
        let bundle = ExportBundle::from_dataset(&dataset(), period());
        assert_eq!(bundle.filename_hint, "margin-analysis-March-2024");
        assert_eq!(bundle.top_items.len(), 2);
        assert!(bundle.top_items.iter().all(|i| i.item_code != "ADJ"));
    }

    #[test]
    fn test_bundle_json_keys() {
        let bundle = ExportBundle::from_dataset(&dataset(), period());
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("topItems").is_some());
        assert!(json.get("topCustomers").is_some());
        assert!(json.get("categories").is_some());
        assert_eq!(json["filenameHint"], "margin-analysis-March-2024");
    }

    #[test]
    fn test_csv_sink_writes_three_sheets() {
        let dir = TempDir::new().unwrap();
        let sink = CsvExportSink::new(dir.path().join("out"));
        let bundle = ExportBundle::from_dataset(&dataset(), period());

        let paths = sink.write(&bundle).unwrap();
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("margin-analysis-March-2024-items.csv"));
        assert!(paths[1].ends_with("margin-analysis-March-2024-customers.csv"));
        assert!(paths[2].ends_with("margin-analysis-March-2024-categories.csv"));

        let items = fs::read_to_string(&paths[0]).unwrap();
        let mut lines = items.lines();
        assert_eq!(
            lines.next().unwrap(),
            "item_code,description,posting_group,vendor_code,vendor_name,total_quantity,total_sales,total_cost,margin,margin_percent"
        );
        // Embedded comma is quoted
        assert!(lines.next().unwrap().starts_with("X1,\"Bolt, hex\",HW,,,"));
        assert_eq!(items.lines().count(), 3);
    }

    #[test]
    fn test_csv_with_empty_arrays_keeps_header() {
        let dir = TempDir::new().unwrap();
        let bundle = ExportBundle::from_dataset(&ProcessedMarginDataset::empty(), period());
        let paths = CsvExportSink::new(dir.path()).write(&bundle).unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            let content = fs::read_to_string(path).unwrap();
            assert_eq!(content.lines().count(), 1, "{}", path.display());
        }
        assert_eq!(
            fs::read_to_string(&paths[0]).unwrap().trim(),
            "item_code,description,posting_group,vendor_code,vendor_name,\
             total_quantity,total_sales,total_cost,margin,margin_percent"
        );
    }

    #[test]
    fn test_empty_csv_header_matches_populated_header() {
        let empty = categories_csv(&[]).unwrap();
        let full = categories_csv(&dataset().categories).unwrap();
        assert_eq!(empty.lines().next(), full.lines().next());
        assert_eq!(customers_csv(&[]).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_json_sink_round_trips() {
        let dir = TempDir::new().unwrap();
        let bundle = ExportBundle::from_dataset(&dataset(), period());
        let paths = JsonExportSink::new(dir.path()).write(&bundle).unwrap();
        assert_eq!(paths.len(), 1);

        let content = fs::read_to_string(&paths[0]).unwrap();
        let restored: ExportBundle = serde_json::from_str(&content).unwrap();
        assert_eq!(restored, bundle);
    }

    #[test]
    fn test_format_parsing_and_sink_selection() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xlsx".parse::<ExportFormat>().is_err());
        let dir = TempDir::new().unwrap();
        assert_eq!(ExportFormat::Json.sink(dir.path()).format(), ExportFormat::Json);
    }

    #[test]
    fn test_items_csv_string() {
        let csv = items_csv(&dataset().top_items).unwrap();
        assert!(csv.lines().any(|l| l.starts_with("X2,Nut,,,,")));
    }
}
