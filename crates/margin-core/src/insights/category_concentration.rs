//! Category Concentration Insight
//!
//! Notes when a single posting group carries at least half of the sales.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::engine::Insight;
use super::types::{Finding, InsightType, InsightsInput, Severity};

/// Share of total category sales that counts as concentrated
const CONCENTRATION_SHARE: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConcentrationData {
    pub posting_group: String,
    pub share_percent: f64,
    pub category_sales: f64,
    pub total_sales: f64,
    pub margin_percent: f64,
}

pub struct CategoryConcentrationInsight;

impl CategoryConcentrationInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CategoryConcentrationInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for CategoryConcentrationInsight {
    fn id(&self) -> InsightType {
        InsightType::CategoryConcentration
    }

    fn name(&self) -> &'static str {
        "Category Concentration"
    }

    fn analyze(&self, input: &InsightsInput) -> Result<Vec<Finding>> {
        if input.categories.len() < 2 {
            return Ok(vec![]);
        }

        let total_sales: f64 = input
            .categories
            .iter()
            .map(|c| c.total_sales.max(0.0))
            .sum();
        if total_sales <= 0.0 {
            return Ok(vec![]);
        }

        let Some(top) = input.categories.iter().max_by(|a, b| {
            a.total_sales
                .partial_cmp(&b.total_sales)
                .unwrap_or(std::cmp::Ordering::Equal)
        }) else {
            return Ok(vec![]);
        };

        let share_percent = top.total_sales / total_sales * 100.0;
        if share_percent < CONCENTRATION_SHARE {
            return Ok(vec![]);
        }

        let data = CategoryConcentrationData {
            posting_group: top.posting_group.clone(),
            share_percent,
            category_sales: top.total_sales,
            total_sales,
            margin_percent: top.margin_percent,
        };

        let finding = Finding::new(
            InsightType::CategoryConcentration,
            format!("category_concentration:{}", top.posting_group),
            Severity::Info,
            "Sales Concentrated",
            format!(
                "{} accounts for {:.0}% of category sales at {:.1}% margin",
                top.posting_group, share_percent, top.margin_percent
            ),
        )
        .with_data(serde_json::to_value(&data).unwrap_or_default());

        Ok(vec![finding])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryMarginRecord, ProcessedMarginDataset};
    use crate::view_mode::ViewMode;

    fn input(categories: Vec<CategoryMarginRecord>) -> InsightsInput {
        let dataset = ProcessedMarginDataset {
            categories,
            ..Default::default()
        };
        InsightsInput::from_dataset(&dataset, ViewMode::Standard)
    }

    #[test]
    fn test_detects_dominant_category() {
        let findings = CategoryConcentrationInsight::new()
            .analyze(&input(vec![
                CategoryMarginRecord::new("A", 1.0, 700.0, 500.0),
                CategoryMarginRecord::new("B", 1.0, 300.0, 200.0),
            ]))
            .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].key, "category_concentration:A");
        let data: CategoryConcentrationData =
            serde_json::from_value(findings[0].data.clone()).unwrap();
        assert!((data.share_percent - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_balanced_categories_no_finding() {
        let findings = CategoryConcentrationInsight::new()
            .analyze(&input(vec![
                CategoryMarginRecord::new("A", 1.0, 400.0, 300.0),
                CategoryMarginRecord::new("B", 1.0, 350.0, 200.0),
                CategoryMarginRecord::new("C", 1.0, 250.0, 200.0),
            ]))
            .unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_single_category_is_ignored() {
        let findings = CategoryConcentrationInsight::new()
            .analyze(&input(vec![CategoryMarginRecord::new("A", 1.0, 400.0, 300.0)]))
            .unwrap();
        assert!(findings.is_empty());
    }
}
