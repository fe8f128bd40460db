//! Negative Margin Insight
//!
//! Flags items and customers that were sold below cost in the period.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::MarginRecord;

use super::engine::Insight;
use super::types::{Finding, InsightType, InsightsInput, Severity};

/// Number of records listed in a finding's data payload
const MAX_LISTED: usize = 5;

/// Structured payload for a negative margin finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeMarginData {
    pub kind: String,
    pub count: usize,
    pub total_loss: f64,
    pub worst: Vec<NegativeMarginEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeMarginEntry {
    pub key: String,
    pub name: String,
    pub margin: f64,
    pub margin_percent: f64,
}

/// Insight that surfaces records with margin below zero
pub struct NegativeMarginInsight;

impl NegativeMarginInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NegativeMarginInsight {
    fn default() -> Self {
        Self::new()
    }
}

fn negative_finding<T: MarginRecord>(records: &[T], label: &str) -> Option<Finding> {
    let mut losing: Vec<&T> = records.iter().filter(|r| r.margin() < 0.0).collect();
    if losing.is_empty() {
        return None;
    }

    // Largest loss first
    losing.sort_by(|a, b| {
        a.margin()
            .partial_cmp(&b.margin())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_loss: f64 = losing.iter().map(|r| r.margin()).sum();
    let data = NegativeMarginData {
        kind: T::KIND.as_str().to_string(),
        count: losing.len(),
        total_loss,
        worst: losing
            .iter()
            .take(MAX_LISTED)
            .map(|r| NegativeMarginEntry {
                key: r.key().to_string(),
                name: r.display_name().to_string(),
                margin: r.margin(),
                margin_percent: r.margin_percent(),
            })
            .collect(),
    };

    let names: Vec<&str> = losing
        .iter()
        .take(MAX_LISTED)
        .map(|r| r.key())
        .collect();

    Some(
        Finding::new(
            InsightType::NegativeMargin,
            format!("negative_margin:{}", T::KIND),
            Severity::Alert,
            "Sold Below Cost",
            format!(
                "{} {} sold below cost, losing {:.2} in total",
                losing.len(),
                label,
                total_loss.abs()
            ),
        )
        .with_detail(format!("Largest losses: {}", names.join(", ")))
        .with_data(serde_json::to_value(&data).unwrap_or_default()),
    )
}

impl Insight for NegativeMarginInsight {
    fn id(&self) -> InsightType {
        InsightType::NegativeMargin
    }

    fn name(&self) -> &'static str {
        "Negative Margin"
    }

    fn analyze(&self, input: &InsightsInput) -> Result<Vec<Finding>> {
        let findings = [
            negative_finding(&input.items, "items"),
            negative_finding(&input.customers, "customers"),
        ];
        Ok(findings.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerMarginRecord, ItemMarginRecord, ProcessedMarginDataset};
    use crate::view_mode::ViewMode;

    #[test]
    fn test_reports_items_and_customers_separately() {
        let dataset = ProcessedMarginDataset {
            top_items: vec![
                ItemMarginRecord::new("OK", "Fine", 1.0, 100.0, 50.0),
                ItemMarginRecord::new("L1", "Loss one", 1.0, 100.0, 110.0),
                ItemMarginRecord::new("L2", "Loss two", 1.0, 100.0, 140.0),
            ],
            top_customers: vec![CustomerMarginRecord::new("C1", "Acme", 1.0, 10.0, 11.0)],
            ..Default::default()
        };
        let input = InsightsInput::from_dataset(&dataset, ViewMode::Standard);
        let findings = NegativeMarginInsight::new().analyze(&input).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].key, "negative_margin:item");
        assert_eq!(findings[1].key, "negative_margin:customer");

        let data: NegativeMarginData = serde_json::from_value(findings[0].data.clone()).unwrap();
        assert_eq!(data.count, 2);
        assert_eq!(data.worst[0].key, "L2");
        assert!((data.total_loss + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_findings_when_all_profitable() {
        let dataset = ProcessedMarginDataset {
            top_items: vec![ItemMarginRecord::new("OK", "Fine", 1.0, 100.0, 50.0)],
            ..Default::default()
        };
        let input = InsightsInput::from_dataset(&dataset, ViewMode::Standard);
        assert!(NegativeMarginInsight::new().analyze(&input).unwrap().is_empty());
    }
}
