//! Bounded projection of margin records for bar-chart comparison

use serde::Serialize;

use crate::band::{classify, Band};
use crate::models::{
    CategoryMarginRecord, CustomerMarginRecord, ItemMarginRecord, MarginRecord, RecordKind,
};

/// Maximum number of bars in a chart
pub const CHART_LIMIT: usize = 10;

/// Records that can be drawn as a chart bar
pub trait ChartSource: MarginRecord {
    /// (category axis key, display name)
    fn chart_labels(&self) -> (&str, &str);
}

impl ChartSource for ItemMarginRecord {
    fn chart_labels(&self) -> (&str, &str) {
        (&self.item_code, &self.description)
    }
}

impl ChartSource for CustomerMarginRecord {
    fn chart_labels(&self) -> (&str, &str) {
        (&self.customer_code, &self.customer_name)
    }
}

impl ChartSource for CategoryMarginRecord {
    fn chart_labels(&self) -> (&str, &str) {
        (&self.posting_group, &self.posting_group)
    }
}

/// One bar: tooltip figures plus the value and band that drive height and fill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDatum {
    pub kind: RecordKind,
    pub category: String,
    pub name: String,
    pub total_sales: f64,
    pub total_cost: f64,
    pub margin: f64,
    pub margin_percent: f64,
    /// Bar height
    pub value: f64,
    pub band: Band,
    pub color: &'static str,
}

/// First [`CHART_LIMIT`] records as chart data
///
/// Callers sort and filter beforehand; this only caps and reshapes.
pub fn project<T: ChartSource>(records: &[T]) -> Vec<ChartDatum> {
    records
        .iter()
        .take(CHART_LIMIT)
        .map(|record| {
            let (category, name) = record.chart_labels();
            let band = classify(record.margin_percent());
            ChartDatum {
                kind: T::KIND,
                category: category.to_string(),
                name: name.to_string(),
                total_sales: record.total_sales(),
                total_cost: record.total_cost(),
                margin: record.margin(),
                margin_percent: record.margin_percent(),
                value: record.margin_percent(),
                band,
                color: band.color(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_at_ten() {
        let items: Vec<ItemMarginRecord> = (0..25)
            .map(|i| ItemMarginRecord::new(&format!("I{}", i), "thing", 1.0, 100.0, 80.0))
            .collect();
        let data = project(&items);
        assert_eq!(data.len(), CHART_LIMIT);
        assert_eq!(data[0].category, "I0");
        assert_eq!(data[9].category, "I9");
    }

    #[test]
    fn test_shorter_input_is_kept_whole() {
        let customers = vec![
            CustomerMarginRecord::new("C1", "Acme", 1.0, 100.0, 60.0).with_search_name("ACME"),
            CustomerMarginRecord::new("C2", "Beta", 1.0, 100.0, 90.0),
        ];
        let data = project(&customers);
        assert_eq!(data.len(), 2);
        // Chart labels use customer_name, not the search name
        assert_eq!(data[0].name, "Acme");
        assert_eq!(data[0].kind, RecordKind::Customer);
    }

    #[test]
    fn test_datum_carries_tooltip_figures_and_band() {
        let items = vec![ItemMarginRecord::new("X1", "Widget", 3.0, 100.0, 72.0)];
        let datum = &project(&items)[0];
        assert_eq!(datum.name, "Widget");
        assert_eq!(datum.total_sales, 100.0);
        assert_eq!(datum.total_cost, 72.0);
        assert!((datum.margin - 28.0).abs() < 1e-9);
        assert_eq!(datum.value, datum.margin_percent);
        assert_eq!(datum.band, Band::High);
        assert_eq!(datum.color, "green");
    }

    #[test]
    fn test_category_uses_posting_group_for_both_labels() {
        let categories =
            vec![CategoryMarginRecord::new("HW", 1.0, 100.0, 90.0).with_description("Hardware")];
        let datum = &project(&categories)[0];
        assert_eq!(datum.category, "HW");
        assert_eq!(datum.name, "HW");
        assert_eq!(datum.band, Band::Low);
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<CategoryMarginRecord> = vec![];
        assert!(project(&empty).is_empty());
    }
}
