//! Data model for processed margin datasets
//!
//! These types mirror the payload produced by the external aggregation
//! service. A dataset covers one (year, month) period and is never mutated
//! once loaded; every view is a projection over it.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Month};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Earliest year accepted for a period selection
pub const MIN_YEAR: i32 = 2000;

/// Latest year accepted for a period selection
pub const MAX_YEAR: i32 = 2100;

/// Display name used when a customer has neither a search name nor a name
pub const UNKNOWN_NAME: &str = "Unknown";

/// Allowed drift between `margin` and `total_sales - total_cost`
pub const MARGIN_TOLERANCE: f64 = 0.01;

/// Margin as a percentage of sales, or 0 when there are no sales
pub fn margin_percent_of(total_sales: f64, margin: f64) -> f64 {
    if total_sales > 0.0 && total_sales.is_finite() && margin.is_finite() {
        margin * 100.0 / total_sales
    } else {
        0.0
    }
}

/// Which of the three record families a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Item,
    Customer,
    Category,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Item => "item",
            RecordKind::Customer => "customer",
            RecordKind::Category => "category",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "item" | "items" => Ok(RecordKind::Item),
            "customer" | "customers" => Ok(RecordKind::Customer),
            "category" | "categories" => Ok(RecordKind::Category),
            _ => Err(format!("Unknown record kind: {}", s)),
        }
    }
}

/// Common read access to the figures every margin record carries
pub trait MarginRecord {
    /// Record family, used to pick labels and field sets generically
    const KIND: RecordKind;

    /// Unique key within a period (item code, customer code, posting group)
    fn key(&self) -> &str;

    /// Human-facing name with fallbacks applied
    fn display_name(&self) -> &str;

    fn total_quantity(&self) -> f64;
    fn total_sales(&self) -> f64;
    fn total_cost(&self) -> f64;
    fn margin(&self) -> f64;
    fn margin_percent(&self) -> f64;

    /// Whether margin and margin percent agree with sales and cost
    fn is_consistent(&self) -> bool {
        let expected_margin = self.total_sales() - self.total_cost();
        let expected_percent = margin_percent_of(self.total_sales(), self.margin());
        (self.margin() - expected_margin).abs() <= MARGIN_TOLERANCE
            && (self.margin_percent() - expected_percent).abs() <= MARGIN_TOLERANCE
    }
}

/// Period-wide totals, with optional credit-memo adjusted figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub margin_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_credit_memos: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_memo_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_memo_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_sales: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_margin: Option<f64>,
    /// Supplied by the aggregation service; passed through, never recomputed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_margin_percent: Option<f64>,
}

/// The three adjusted overall figures, only available as a complete set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedFigures {
    pub sales: f64,
    pub margin: f64,
    pub margin_percent: f64,
}

impl OverallSummary {
    /// Gross totals with margin and margin percent derived from sales and cost
    pub fn new(total_sales: f64, total_cost: f64) -> Self {
        let margin = total_sales - total_cost;
        Self {
            total_sales,
            total_cost,
            margin,
            margin_percent: margin_percent_of(total_sales, margin),
            ..Default::default()
        }
    }

    /// Adjusted figures, or `None` when any of the three is missing
    pub fn adjusted_figures(&self) -> Option<AdjustedFigures> {
        match (
            self.adjusted_sales,
            self.adjusted_margin,
            self.adjusted_margin_percent,
        ) {
            (Some(sales), Some(margin), Some(margin_percent)) => Some(AdjustedFigures {
                sales,
                margin,
                margin_percent,
            }),
            _ => None,
        }
    }
}

/// Per-item aggregates for the period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMarginRecord {
    #[serde(default)]
    pub item_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_quantity: f64,
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub margin_percent: f64,
    /// Category code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
}

impl ItemMarginRecord {
    pub fn new(
        item_code: &str,
        description: &str,
        total_quantity: f64,
        total_sales: f64,
        total_cost: f64,
    ) -> Self {
        let margin = total_sales - total_cost;
        Self {
            item_code: item_code.to_string(),
            description: description.to_string(),
            total_quantity,
            total_sales,
            total_cost,
            margin,
            margin_percent: margin_percent_of(total_sales, margin),
            ..Default::default()
        }
    }

    pub fn with_posting_group(mut self, posting_group: &str) -> Self {
        self.posting_group = Some(posting_group.to_string());
        self
    }
}

impl MarginRecord for ItemMarginRecord {
    const KIND: RecordKind = RecordKind::Item;

    fn key(&self) -> &str {
        &self.item_code
    }

    fn display_name(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.item_code
        } else {
            &self.description
        }
    }

    fn total_quantity(&self) -> f64 {
        self.total_quantity
    }
    fn total_sales(&self) -> f64 {
        self.total_sales
    }
    fn total_cost(&self) -> f64 {
        self.total_cost
    }
    fn margin(&self) -> f64 {
        self.margin
    }
    fn margin_percent(&self) -> f64 {
        self.margin_percent
    }
}

/// Per-customer aggregates for the period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerMarginRecord {
    #[serde(default)]
    pub customer_code: String,
    #[serde(default)]
    pub customer_name: String,
    /// Preferred display name when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_name: Option<String>,
    #[serde(default)]
    pub total_quantity: f64,
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub margin_percent: f64,
}

impl CustomerMarginRecord {
    pub fn new(
        customer_code: &str,
        customer_name: &str,
        total_quantity: f64,
        total_sales: f64,
        total_cost: f64,
    ) -> Self {
        let margin = total_sales - total_cost;
        Self {
            customer_code: customer_code.to_string(),
            customer_name: customer_name.to_string(),
            search_name: None,
            total_quantity,
            total_sales,
            total_cost,
            margin,
            margin_percent: margin_percent_of(total_sales, margin),
        }
    }

    pub fn with_search_name(mut self, search_name: &str) -> Self {
        self.search_name = Some(search_name.to_string());
        self
    }
}

impl MarginRecord for CustomerMarginRecord {
    const KIND: RecordKind = RecordKind::Customer;

    fn key(&self) -> &str {
        &self.customer_code
    }

    /// search_name, then customer_name, then a placeholder
    fn display_name(&self) -> &str {
        match self.search_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ if !self.customer_name.trim().is_empty() => &self.customer_name,
            _ => UNKNOWN_NAME,
        }
    }

    fn total_quantity(&self) -> f64 {
        self.total_quantity
    }
    fn total_sales(&self) -> f64 {
        self.total_sales
    }
    fn total_cost(&self) -> f64 {
        self.total_cost
    }
    fn margin(&self) -> f64 {
        self.margin
    }
    fn margin_percent(&self) -> f64 {
        self.margin_percent
    }
}

/// Per-posting-group aggregates for the period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMarginRecord {
    #[serde(default)]
    pub posting_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_description: Option<String>,
    #[serde(default)]
    pub total_quantity: f64,
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub margin_percent: f64,
}

impl CategoryMarginRecord {
    pub fn new(
        posting_group: &str,
        total_quantity: f64,
        total_sales: f64,
        total_cost: f64,
    ) -> Self {
        let margin = total_sales - total_cost;
        Self {
            posting_group: posting_group.to_string(),
            category_description: None,
            total_quantity,
            total_sales,
            total_cost,
            margin,
            margin_percent: margin_percent_of(total_sales, margin),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.category_description = Some(description.to_string());
        self
    }
}

impl MarginRecord for CategoryMarginRecord {
    const KIND: RecordKind = RecordKind::Category;

    fn key(&self) -> &str {
        &self.posting_group
    }

    fn display_name(&self) -> &str {
        match self.category_description.as_deref() {
            Some(desc) if !desc.trim().is_empty() => desc,
            _ => &self.posting_group,
        }
    }

    fn total_quantity(&self) -> f64 {
        self.total_quantity
    }
    fn total_sales(&self) -> f64 {
        self.total_sales
    }
    fn total_cost(&self) -> f64 {
        self.total_cost
    }
    fn margin(&self) -> f64 {
        self.margin
    }
    fn margin_percent(&self) -> f64 {
        self.margin_percent
    }
}

/// A full period payload as produced by the aggregation service
///
/// `adjusted_items` and `adjusted_customers` are complete alternate record
/// sets, not deltas, and may hold a different number of records than their
/// gross counterparts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMarginDataset {
    #[serde(default)]
    pub overall: Option<OverallSummary>,
    #[serde(default)]
    pub top_items: Vec<ItemMarginRecord>,
    #[serde(default)]
    pub top_customers: Vec<CustomerMarginRecord>,
    #[serde(default)]
    pub categories: Vec<CategoryMarginRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_items: Option<Vec<ItemMarginRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjusted_customers: Option<Vec<CustomerMarginRecord>>,
}

impl ProcessedMarginDataset {
    /// Dataset with no overall record and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.overall.is_none()
            && self.top_items.is_empty()
            && self.top_customers.is_empty()
            && self.categories.is_empty()
    }

    /// Records whose margin or margin percent disagrees with sales and cost
    pub fn inconsistent_records(&self) -> usize {
        fn count<T: MarginRecord>(records: &[T]) -> usize {
            records.iter().filter(|r| !r.is_consistent()).count()
        }
        count(&self.top_items)
            + count(&self.top_customers)
            + count(&self.categories)
            + self.adjusted_items.as_deref().map_or(0, count)
            + self.adjusted_customers.as_deref().map_or(0, count)
    }

    /// Whether any credit-memo adjusted data was computed for the period
    pub fn has_adjusted_data(&self) -> bool {
        self.adjusted_items.as_ref().is_some_and(|v| !v.is_empty())
            || self
                .adjusted_customers
                .as_ref()
                .is_some_and(|v| !v.is_empty())
            || self
                .overall
                .as_ref()
                .and_then(OverallSummary::adjusted_figures)
                .is_some()
    }
}

/// A (year, month) selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(Error::InvalidPeriod(format!(
                "year {} outside {}..={}",
                year, MIN_YEAR, MAX_YEAR
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidPeriod(format!(
                "month {} outside 1..=12",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// The current calendar month in local time
    pub fn current() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year().clamp(MIN_YEAR, MAX_YEAR),
            month: today.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// English month name, e.g. "March"
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or(UNKNOWN_NAME)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| Error::InvalidPeriod(format!("expected YYYY-MM, got '{}'", s)))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| Error::InvalidPeriod(format!("invalid year in '{}'", s)))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| Error::InvalidPeriod(format!("invalid month in '{}'", s)))?;
        Period::new(year, month)
    }
}

/// Optional narrowing passed through to the aggregation service
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salesperson: Option<String>,
}

impl DatasetScope {
    pub fn is_unscoped(&self) -> bool {
        self.category.is_none() && self.salesperson.is_none()
    }
}
