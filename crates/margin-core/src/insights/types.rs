//! Core types for margin insights

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{
    CategoryMarginRecord, CustomerMarginRecord, ItemMarginRecord, OverallSummary,
    ProcessedMarginDataset,
};
use crate::view_mode::{active_customers, active_items, active_overall, OverallView, ViewMode};

/// Types of insights the built-in analyzers produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    /// Selling items whose margin falls in the Low band
    LowMarginItems,
    /// Items or customers sold below cost
    NegativeMargin,
    /// How much credit memos pulled the margin down
    CreditMemoImpact,
    /// One category carrying most of the sales
    CategoryConcentration,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::LowMarginItems => "low_margin_items",
            InsightType::NegativeMargin => "negative_margin",
            InsightType::CreditMemoImpact => "credit_memo_impact",
            InsightType::CategoryConcentration => "category_concentration",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_margin_items" => Ok(InsightType::LowMarginItems),
            "negative_margin" => Ok(InsightType::NegativeMargin),
            "credit_memo_impact" => Ok(InsightType::CreditMemoImpact),
            "category_concentration" => Ok(InsightType::CategoryConcentration),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// Severity level of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Info,
    /// Worth attention but not urgent
    Attention,
    /// Should be addressed soon
    Warning,
    /// Requires immediate attention
    Alert,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Attention => "attention",
            Severity::Warning => "warning",
            Severity::Alert => "alert",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Info => 1,
            Severity::Attention => 2,
            Severity::Warning => 3,
            Severity::Alert => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "attention" => Ok(Severity::Attention),
            "warning" => Ok(Severity::Warning),
            "alert" => Ok(Severity::Alert),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// A finding produced by an insight analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Type of insight that generated this finding
    pub insight_type: InsightType,
    /// Unique key for deduplication (e.g., "negative_margin:item:X1")
    pub key: String,
    pub severity: Severity,
    /// Short title (e.g., "Sold Below Cost")
    pub title: String,
    /// One-line summary
    pub summary: String,
    pub detail: Option<String>,
    /// Insight-specific structured data
    pub data: serde_json::Value,
}

impl Finding {
    pub fn new(
        insight_type: InsightType,
        key: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            insight_type,
            key: key.into(),
            severity,
            title: title.into(),
            summary: summary.into(),
            detail: None,
            data: serde_json::Value::Null,
        }
    }

    /// Add optional detail text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// The mode-aware dataset handed to analyzers, unfiltered and untruncated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsInput {
    pub view_mode: ViewMode,
    pub overall: Option<OverallView>,
    /// Raw overall record, so analyzers can compare gross and adjusted
    pub overall_summary: Option<OverallSummary>,
    pub items: Vec<ItemMarginRecord>,
    pub customers: Vec<CustomerMarginRecord>,
    pub categories: Vec<CategoryMarginRecord>,
}

impl InsightsInput {
    pub fn from_dataset(dataset: &ProcessedMarginDataset, mode: ViewMode) -> Self {
        Self {
            view_mode: mode,
            overall: active_overall(dataset, mode),
            overall_summary: dataset.overall.clone(),
            items: active_items(dataset, mode).to_vec(),
            customers: active_customers(dataset, mode).to_vec(),
            categories: dataset.categories.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_type_round_trip_names() {
        assert_eq!(InsightType::NegativeMargin.as_str(), "negative_margin");
        assert_eq!(
            InsightType::from_str("credit_memo_impact").unwrap(),
            InsightType::CreditMemoImpact
        );
        assert!(InsightType::from_str("zombie").is_err());
    }

    #[test]
    fn test_severity_priority() {
        assert!(Severity::Alert.priority() > Severity::Warning.priority());
        assert!(Severity::Warning.priority() > Severity::Attention.priority());
        assert!(Severity::Attention.priority() > Severity::Info.priority());
    }

    #[test]
    fn test_finding_builder() {
        let finding = Finding::new(
            InsightType::LowMarginItems,
            "test:key",
            Severity::Warning,
            "Test Title",
            "Test summary",
        )
        .with_detail("More details here")
        .with_data(serde_json::json!({"count": 3}));

        assert_eq!(finding.key, "test:key");
        assert_eq!(finding.detail.unwrap(), "More details here");
        assert_eq!(finding.data["count"], 3);
    }

    #[test]
    fn test_input_is_mode_aware() {
        let dataset = ProcessedMarginDataset {
            top_items: vec![ItemMarginRecord::new("A", "a", 1.0, 10.0, 5.0)],
            adjusted_items: Some(vec![
                ItemMarginRecord::new("A", "a", 1.0, 8.0, 5.0),
                ItemMarginRecord::new("B", "b", 1.0, 8.0, 5.0),
            ]),
            ..Default::default()
        };
        assert_eq!(InsightsInput::from_dataset(&dataset, ViewMode::Standard).items.len(), 1);
        assert_eq!(InsightsInput::from_dataset(&dataset, ViewMode::Adjusted).items.len(), 2);
    }
}
