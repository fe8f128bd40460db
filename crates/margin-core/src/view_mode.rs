//! Standard vs credit-memo adjusted dataset selection
//!
//! Switching mode only re-selects which arrays and overall figures are read;
//! the dataset itself is never touched, so toggling is lossless.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::band::{classify, Band};
use crate::models::{CustomerMarginRecord, ItemMarginRecord, ProcessedMarginDataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Gross figures
    #[default]
    Standard,
    /// Credit-memo aware figures
    Adjusted,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Standard => "standard",
            ViewMode::Adjusted => "adjusted",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "gross" => Ok(ViewMode::Standard),
            "adjusted" | "credit_memo" | "credit-memo" => Ok(ViewMode::Adjusted),
            _ => Err(format!("Unknown view mode: {}", s)),
        }
    }
}

/// Pick the adjusted array when it carries data, else the standard one
fn pick<'a, T>(standard: &'a [T], adjusted: Option<&'a Vec<T>>) -> &'a [T] {
    match adjusted {
        Some(rows) if !rows.is_empty() => rows.as_slice(),
        _ => standard,
    }
}

/// Items for the given mode
///
/// Adjusted mode falls back to the standard items when no adjusted items
/// were computed for the period.
pub fn active_items(dataset: &ProcessedMarginDataset, mode: ViewMode) -> &[ItemMarginRecord] {
    match mode {
        ViewMode::Standard => &dataset.top_items,
        ViewMode::Adjusted => pick(&dataset.top_items, dataset.adjusted_items.as_ref()),
    }
}

/// Customers for the given mode, with the same fallback as [`active_items`]
pub fn active_customers(
    dataset: &ProcessedMarginDataset,
    mode: ViewMode,
) -> &[CustomerMarginRecord] {
    match mode {
        ViewMode::Standard => &dataset.top_customers,
        ViewMode::Adjusted => pick(&dataset.top_customers, dataset.adjusted_customers.as_ref()),
    }
}

/// Overall figures as shown on the summary card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallView {
    pub total_sales: f64,
    pub total_cost: f64,
    pub margin: f64,
    pub margin_percent: f64,
    pub band: Band,
    /// True only when adjusted figures were actually substituted
    pub adjusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_credit_memos: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_memo_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_memo_quantity: Option<f64>,
    /// Gross margin percent, kept for comparison in adjusted mode
    pub gross_margin_percent: f64,
}

/// Overall record for the given mode, or `None` when the dataset has none
pub fn active_overall(dataset: &ProcessedMarginDataset, mode: ViewMode) -> Option<OverallView> {
    let overall = dataset.overall.as_ref()?;

    let adjusted = match mode {
        ViewMode::Standard => None,
        ViewMode::Adjusted => overall.adjusted_figures(),
    };

    let (total_sales, margin, margin_percent) = match adjusted {
        Some(fig) => (fig.sales, fig.margin, fig.margin_percent),
        None => (overall.total_sales, overall.margin, overall.margin_percent),
    };

    Some(OverallView {
        total_sales,
        total_cost: overall.total_cost,
        margin,
        margin_percent,
        band: classify(margin_percent),
        adjusted: adjusted.is_some(),
        total_credit_memos: overall.total_credit_memos,
        credit_memo_amount: overall.credit_memo_amount,
        credit_memo_quantity: overall.credit_memo_quantity,
        gross_margin_percent: overall.margin_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OverallSummary;

    fn dataset() -> ProcessedMarginDataset {
        ProcessedMarginDataset {
            overall: Some(OverallSummary::new(1000.0, 750.0)),
            top_items: vec![
                ItemMarginRecord::new("A", "Alpha", 1.0, 100.0, 70.0),
                ItemMarginRecord::new("B", "Beta", 1.0, 50.0, 45.0),
            ],
            top_customers: vec![CustomerMarginRecord::new("C1", "Acme", 1.0, 150.0, 115.0)],
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_returns_gross_arrays() {
        let ds = dataset();
        assert_eq!(active_items(&ds, ViewMode::Standard), ds.top_items.as_slice());
        assert_eq!(
            active_customers(&ds, ViewMode::Standard),
            ds.top_customers.as_slice()
        );
    }

    #[test]
    fn test_adjusted_falls_back_when_absent() {
        let ds = dataset();
        let items = active_items(&ds, ViewMode::Adjusted);
        let codes: Vec<&str> = items.iter().map(|i| i.item_code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(active_customers(&ds, ViewMode::Adjusted).len(), 1);
    }

    #[test]
    fn test_adjusted_falls_back_when_empty() {
        let mut ds = dataset();
        ds.adjusted_items = Some(vec![]);
        assert_eq!(active_items(&ds, ViewMode::Adjusted).len(), 2);
    }

    #[test]
    fn test_adjusted_swaps_whole_array() {
        let mut ds = dataset();
        ds.adjusted_items = Some(vec![ItemMarginRecord::new("A", "Alpha", 1.0, 90.0, 70.0)]);
        let items = active_items(&ds, ViewMode::Adjusted);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total_sales, 90.0);
        // Standard view is untouched
        assert_eq!(active_items(&ds, ViewMode::Standard).len(), 2);
    }

    #[test]
    fn test_toggle_is_lossless() {
        let mut ds = dataset();
        ds.adjusted_items = Some(vec![ItemMarginRecord::new("Z", "Zed", 1.0, 10.0, 5.0)]);
        let before = ds.clone();
        let first = active_items(&ds, ViewMode::Adjusted).to_vec();
        let _ = active_items(&ds, ViewMode::Standard);
        let second = active_items(&ds, ViewMode::Adjusted).to_vec();
        assert_eq!(first, second);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_overall_substitutes_complete_adjusted_figures() {
        let mut ds = dataset();
        if let Some(overall) = ds.overall.as_mut() {
            overall.adjusted_sales = Some(950.0);
            overall.adjusted_margin = Some(200.0);
            overall.adjusted_margin_percent = Some(21.05);
            overall.credit_memo_amount = Some(50.0);
        }

        let standard = active_overall(&ds, ViewMode::Standard).unwrap();
        assert_eq!(standard.total_sales, 1000.0);
        assert!(!standard.adjusted);
        assert_eq!(standard.band, Band::Medium);

        let adjusted = active_overall(&ds, ViewMode::Adjusted).unwrap();
        assert_eq!(adjusted.total_sales, 950.0);
        assert_eq!(adjusted.margin, 200.0);
        assert_eq!(adjusted.margin_percent, 21.05);
        assert_eq!(adjusted.total_cost, 750.0);
        assert_eq!(adjusted.gross_margin_percent, 25.0);
        assert_eq!(adjusted.credit_memo_amount, Some(50.0));
        assert!(adjusted.adjusted);
    }

    #[test]
    fn test_overall_partial_adjustment_is_ignored() {
        let mut ds = dataset();
        if let Some(overall) = ds.overall.as_mut() {
            overall.adjusted_sales = Some(950.0);
        }
        let view = active_overall(&ds, ViewMode::Adjusted).unwrap();
        assert_eq!(view.total_sales, 1000.0);
        assert!(!view.adjusted);
    }

    #[test]
    fn test_overall_missing() {
        let ds = ProcessedMarginDataset::empty();
        assert!(active_overall(&ds, ViewMode::Standard).is_none());
        assert!(active_items(&ds, ViewMode::Adjusted).is_empty());
    }

    #[test]
    fn test_parse_view_mode() {
        assert_eq!("Adjusted".parse::<ViewMode>().unwrap(), ViewMode::Adjusted);
        assert_eq!("gross".parse::<ViewMode>().unwrap(), ViewMode::Standard);
        assert!("net".parse::<ViewMode>().is_err());
    }
}
