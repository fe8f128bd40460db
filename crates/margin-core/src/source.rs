//! Dataset sources
//!
//! A source produces one [`ProcessedMarginDataset`] per (year, month) and
//! optional scope. Margin figures are computed upstream; sources only move
//! the payload.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{DatasetScope, Period, ProcessedMarginDataset};

/// Default request timeout for the aggregation service
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which dataset to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetQuery {
    pub period: Period,
    #[serde(default)]
    pub scope: DatasetScope,
}

impl DatasetQuery {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            scope: DatasetScope::default(),
        }
    }

    pub fn with_scope(mut self, scope: DatasetScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Anything that can hand out processed datasets
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the dataset for a period and scope
    async fn fetch(&self, query: &DatasetQuery) -> Result<ProcessedMarginDataset>;

    /// Short description for logs and status output
    fn name(&self) -> String;
}

/// Client for the aggregation service's margin endpoint
#[derive(Clone)]
pub struct HttpDatasetSource {
    http_client: Client,
    base_url: String,
}

impl HttpDatasetSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from `MARGIN_SERVICE_URL`
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("MARGIN_SERVICE_URL").ok()?;
        Self::new(&url, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).ok()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query_params(query: &DatasetQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("year", query.period.year().to_string()),
            ("month", query.period.month().to_string()),
        ];
        if let Some(category) = &query.scope.category {
            params.push(("category", category.clone()));
        }
        if let Some(salesperson) = &query.scope.salesperson {
            params.push(("salesperson", salesperson.clone()));
        }
        params
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self, query: &DatasetQuery) -> Result<ProcessedMarginDataset> {
        let url = format!("{}/margin-analysis", self.base_url);
        debug!(url = %url, period = %query.period, "Fetching margin dataset");

        let response = self
            .http_client
            .get(&url)
            .query(&Self::query_params(query))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "no margin data for {}",
                query.period
            )));
        }
        let response = response.error_for_status()?;

        let dataset: ProcessedMarginDataset = response.json().await?;
        warn_inconsistent(query, &dataset);
        debug!(
            period = %query.period,
            items = dataset.top_items.len(),
            customers = dataset.top_customers.len(),
            "Fetched margin dataset"
        );
        Ok(dataset)
    }

    fn name(&self) -> String {
        format!("http:{}", self.base_url)
    }
}

/// Figures are shown as delivered; mismatches are only logged
fn warn_inconsistent(query: &DatasetQuery, dataset: &ProcessedMarginDataset) {
    let inconsistent = dataset.inconsistent_records();
    if inconsistent > 0 {
        warn!(
            period = %query.period,
            records = inconsistent,
            "Margin figures disagree with sales and cost"
        );
    }
}

/// Directory of `<YYYY>-<MM>.json` payloads
///
/// Scope narrowing is an aggregation-service feature; files are returned
/// whole.
#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    dir: PathBuf,
}

impl FileDatasetSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, period: Period) -> PathBuf {
        self.dir.join(format!("{}.json", period))
    }
}

#[async_trait]
impl DatasetSource for FileDatasetSource {
    async fn fetch(&self, query: &DatasetQuery) -> Result<ProcessedMarginDataset> {
        let path = self.path_for(query.period);
        if !query.scope.is_unscoped() {
            debug!(period = %query.period, "File source ignores dataset scope");
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "no margin data for {} ({})",
                    query.period,
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), "Loaded margin dataset from file");
        let dataset: ProcessedMarginDataset = serde_json::from_str(&content)?;
        warn_inconsistent(query, &dataset);
        Ok(dataset)
    }

    fn name(&self) -> String {
        format!("dir:{}", self.dir.display())
    }
}

/// Datasets held in memory, keyed by period
#[derive(Default)]
pub struct InMemorySource {
    datasets: RwLock<HashMap<Period, ProcessedMarginDataset>>,
    delays: RwLock<HashMap<Period, Duration>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(self, period: Period, dataset: ProcessedMarginDataset) -> Self {
        self.insert(period, dataset);
        self
    }

    /// Delay responses for `period`, to exercise overlapping requests
    pub fn with_delay(self, period: Period, delay: Duration) -> Self {
        if let Ok(mut delays) = self.delays.write() {
            delays.insert(period, delay);
        }
        self
    }

    pub fn insert(&self, period: Period, dataset: ProcessedMarginDataset) {
        if let Ok(mut datasets) = self.datasets.write() {
            datasets.insert(period, dataset);
        }
    }
}

#[async_trait]
impl DatasetSource for InMemorySource {
    async fn fetch(&self, query: &DatasetQuery) -> Result<ProcessedMarginDataset> {
        let delay = self
            .delays
            .read()
            .ok()
            .and_then(|d| d.get(&query.period).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let datasets = self
            .datasets
            .read()
            .map_err(|_| Error::Service("dataset store poisoned".to_string()))?;
        datasets
            .get(&query.period)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no margin data for {}", query.period)))
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}

/// Source for a `--source` style location: a URL or a directory path
pub fn open_source(location: &str, timeout: Duration) -> Result<Box<dyn DatasetSource>> {
    let location = location.trim();
    if location.is_empty() {
        return Err(Error::Config("empty dataset source".to_string()));
    }
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpDatasetSource::new(location, timeout)?))
    } else {
        Ok(Box::new(FileDatasetSource::new(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemMarginRecord;
    use tempfile::TempDir;

    fn period() -> Period {
        Period::new(2024, 3).unwrap()
    }

    #[tokio::test]
    async fn test_file_source_reads_period_file() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "overall": {"total_sales": 100.0, "total_cost": 80.0, "margin": 20.0, "margin_percent": 20.0},
            "topItems": [{"item_code": "X1", "description": "Widget", "total_sales": 100.0}],
            "topCustomers": [],
            "categories": []
        }"#;
        std::fs::write(dir.path().join("2024-03.json"), json).unwrap();

        let source = FileDatasetSource::new(dir.path());
        let dataset = source.fetch(&DatasetQuery::new(period())).await.unwrap();
        assert_eq!(dataset.top_items.len(), 1);
        assert_eq!(dataset.top_items[0].item_code, "X1");
        // Missing numeric fields default to zero
        assert_eq!(dataset.top_items[0].total_cost, 0.0);
        assert!(dataset.adjusted_items.is_none());
    }

    #[tokio::test]
    async fn test_file_source_missing_period_is_not_found() {
        let dir = TempDir::new().unwrap();
        let source = FileDatasetSource::new(dir.path());
        let err = source.fetch(&DatasetQuery::new(period())).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_source_invalid_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("2024-03.json"), "not json").unwrap();
        let source = FileDatasetSource::new(dir.path());
        let err = source.fetch(&DatasetQuery::new(period())).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let dataset = ProcessedMarginDataset {
            top_items: vec![ItemMarginRecord::new("X1", "Widget", 1.0, 10.0, 5.0)],
            ..Default::default()
        };
        let source = InMemorySource::new().with_dataset(period(), dataset.clone());

        assert_eq!(
            source.fetch(&DatasetQuery::new(period())).await.unwrap(),
            dataset
        );
        let other = Period::new(2024, 4).unwrap();
        assert!(matches!(
            source.fetch(&DatasetQuery::new(other)).await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_http_query_params_include_scope() {
        let query = DatasetQuery::new(period()).with_scope(DatasetScope {
            category: Some("HW".to_string()),
            salesperson: None,
        });
        let params = HttpDatasetSource::query_params(&query);
        assert_eq!(
            params,
            vec![
                ("year", "2024".to_string()),
                ("month", "3".to_string()),
                ("category", "HW".to_string()),
            ]
        );
    }

    #[test]
    fn test_open_source_picks_kind() {
        let http = open_source("http://localhost:9/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(http.name(), "http:http://localhost:9/api");

        let dir = open_source("/tmp/margins", Duration::from_secs(1)).unwrap();
        assert_eq!(dir.name(), "dir:/tmp/margins");

        assert!(open_source("  ", Duration::from_secs(1)).is_err());
    }
}
