//! Credit Memo Impact Insight
//!
//! Compares gross and credit-memo adjusted overall margin. The adjusted
//! margin percent comes from the aggregation service as-is.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::engine::Insight;
use super::types::{Finding, InsightType, InsightsInput, Severity};

/// Drop in margin points at which the finding becomes a warning
const WARNING_DROP_POINTS: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditMemoImpactData {
    pub gross_margin_percent: f64,
    pub adjusted_margin_percent: f64,
    pub drop_points: f64,
    pub credit_memo_amount: Option<f64>,
    pub total_credit_memos: Option<f64>,
}

pub struct CreditMemoImpactInsight;

impl CreditMemoImpactInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CreditMemoImpactInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Insight for CreditMemoImpactInsight {
    fn id(&self) -> InsightType {
        InsightType::CreditMemoImpact
    }

    fn name(&self) -> &'static str {
        "Credit Memo Impact"
    }

    fn analyze(&self, input: &InsightsInput) -> Result<Vec<Finding>> {
        let Some(overall) = input.overall_summary.as_ref() else {
            return Ok(vec![]);
        };
        let Some(adjusted) = overall.adjusted_figures() else {
            return Ok(vec![]);
        };

        let drop_points = overall.margin_percent - adjusted.margin_percent;
        if !(drop_points > 0.0) {
            return Ok(vec![]);
        }

        let severity = if drop_points >= WARNING_DROP_POINTS {
            Severity::Warning
        } else {
            Severity::Info
        };

        let data = CreditMemoImpactData {
            gross_margin_percent: overall.margin_percent,
            adjusted_margin_percent: adjusted.margin_percent,
            drop_points,
            credit_memo_amount: overall.credit_memo_amount,
            total_credit_memos: overall.total_credit_memos,
        };

        let mut finding = Finding::new(
            InsightType::CreditMemoImpact,
            "credit_memo_impact",
            severity,
            "Credit Memo Drag",
            format!(
                "Credit memos lower margin from {:.1}% to {:.1}% ({:.1} points)",
                overall.margin_percent, adjusted.margin_percent, drop_points
            ),
        )
        .with_data(serde_json::to_value(&data).unwrap_or_default());

        if let Some(amount) = overall.credit_memo_amount {
            finding = finding.with_detail(format!(
                "{:.2} credited back across {} memos",
                amount,
                overall
                    .total_credit_memos
                    .map(|n| format!("{:.0}", n))
                    .unwrap_or_else(|| "-".to_string())
            ));
        }

        Ok(vec![finding])
    }
}
