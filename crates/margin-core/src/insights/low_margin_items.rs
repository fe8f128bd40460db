//! Low Margin Items Insight
//!
//! Lists selling items whose margin percent lands in the Low band. Items
//! below cost are left to the negative margin insight.

use serde::{Deserialize, Serialize};

use crate::band::{classify, Band};
use crate::error::Result;
use crate::models::ItemMarginRecord;

use super::engine::Insight;
use super::types::{Finding, InsightType, InsightsInput, Severity};

/// Items listed in the payload, largest sales first
const MAX_LISTED: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowMarginItemsData {
    pub count: usize,
    pub sales_at_low_margin: f64,
    pub items: Vec<LowMarginItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowMarginItem {
    pub item_code: String,
    pub description: String,
    pub total_sales: f64,
    pub margin_percent: f64,
}

/// Insight that flags thin-margin items
pub struct LowMarginItemsInsight;

impl LowMarginItemsInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LowMarginItemsInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for LowMarginItemsInsight {
    fn id(&self) -> InsightType {
        InsightType::LowMarginItems
    }

    fn name(&self) -> &'static str {
        "Low Margin Items"
    }

    fn analyze(&self, input: &InsightsInput) -> Result<Vec<Finding>> {
        let mut low: Vec<&ItemMarginRecord> = input
            .items
            .iter()
            .filter(|i| {
                i.total_sales > 0.0 && i.margin >= 0.0 && classify(i.margin_percent) == Band::Low
            })
            .collect();

        if low.is_empty() {
            return Ok(vec![]);
        }

        low.sort_by(|a, b| {
            b.total_sales
                .partial_cmp(&a.total_sales)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let sales_at_low_margin: f64 = low.iter().map(|i| i.total_sales).sum();
        let data = LowMarginItemsData {
            count: low.len(),
            sales_at_low_margin,
            items: low
                .iter()
                .take(MAX_LISTED)
                .map(|i| LowMarginItem {
                    item_code: i.item_code.clone(),
                    description: i.description.clone(),
                    total_sales: i.total_sales,
                    margin_percent: i.margin_percent,
                })
                .collect(),
        };

        let severity = if low.len() > MAX_LISTED {
            Severity::Warning
        } else {
            Severity::Attention
        };

        let finding = Finding::new(
            InsightType::LowMarginItems,
            "low_margin_items",
            severity,
            "Thin Margins",
            format!(
                "{} items sold at a low margin, {:.2} in sales",
                low.len(),
                sales_at_low_margin
            ),
        )
        .with_detail(format!(
            "Biggest sellers in the Low band: {}",
            data.items
                .iter()
                .map(|i| format!("{} ({:.1}%)", i.item_code, i.margin_percent))
                .collect::<Vec<_>>()
                .join(", ")
        ))
        .with_data(serde_json::to_value(&data).unwrap_or_default());

        Ok(vec![finding])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessedMarginDataset;
    use crate::view_mode::ViewMode;

    fn input(items: Vec<ItemMarginRecord>) -> InsightsInput {
        let dataset = ProcessedMarginDataset {
            top_items: items,
            ..Default::default()
        };
        InsightsInput::from_dataset(&dataset, ViewMode::Standard)
    }

    #[test]
    fn test_flags_low_band_items_by_sales() {
        let findings = LowMarginItemsInsight::new()
            .analyze(&input(vec![
                ItemMarginRecord::new("GOOD", "Good", 1.0, 100.0, 60.0),
                ItemMarginRecord::new("THIN1", "Thin", 1.0, 50.0, 45.0),
                ItemMarginRecord::new("THIN2", "Thinner", 1.0, 500.0, 490.0),
                ItemMarginRecord::new("LOSS", "Loss", 1.0, 100.0, 150.0),
                ItemMarginRecord::new("ZERO", "No sales", 1.0, 0.0, 0.0),
            ]))
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Attention);
        let data: LowMarginItemsData = serde_json::from_value(findings[0].data.clone()).unwrap();
        assert_eq!(data.count, 2);
        assert_eq!(data.items[0].item_code, "THIN2");
        assert_eq!(data.items[1].item_code, "THIN1");
    }

    #[test]
    fn test_many_low_items_escalate() {
        let items = (0..8)
            .map(|i| ItemMarginRecord::new(&format!("T{}", i), "Thin", 1.0, 100.0, 95.0))
            .collect();
        let findings = LowMarginItemsInsight::new().analyze(&input(items)).unwrap();
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_boundary_fifteen_percent_is_not_low() {
        let findings = LowMarginItemsInsight::new()
            .analyze(&input(vec![ItemMarginRecord::new("B", "Edge", 1.0, 100.0, 85.0)]))
            .unwrap();
        assert!(findings.is_empty());
    }
}
