//! Insight Engine - runs registered analyzers over the insights input

use crate::Result;

use super::types::{Finding, InsightType, InsightsInput};
use super::{
    CategoryConcentrationInsight, CreditMemoImpactInsight, LowMarginItemsInsight,
    NegativeMarginInsight,
};

/// Trait for insight analyzers
///
/// Analyzers see the whole mode-aware dataset; search, category and top-N
/// selections never reach them.
pub trait Insight: Send + Sync {
    /// Unique identifier for this insight type
    fn id(&self) -> InsightType;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Analyze data and produce findings
    fn analyze(&self, input: &InsightsInput) -> Result<Vec<Finding>>;
}

/// Orchestrates the registered analyzers
pub struct InsightEngine {
    insights: Vec<Box<dyn Insight>>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create a new insight engine with built-in insight types
    pub fn new() -> Self {
        let mut engine = Self::empty();

        engine.register(Box::new(NegativeMarginInsight::new()));
        engine.register(Box::new(LowMarginItemsInsight::new()));
        engine.register(Box::new(CreditMemoImpactInsight::new()));
        engine.register(Box::new(CategoryConcentrationInsight::new()));

        engine
    }

    /// Engine with no analyzers registered
    pub fn empty() -> Self {
        Self { insights: vec![] }
    }

    /// Register an insight analyzer
    pub fn register(&mut self, insight: Box<dyn Insight>) {
        self.insights.push(insight);
    }

    /// Run all analyzers and collect findings, most severe first
    ///
    /// A failing analyzer is logged and skipped; the others still report.
    pub fn analyze_all(&self, input: &InsightsInput) -> Vec<Finding> {
        let mut all_findings = vec![];

        for insight in &self.insights {
            match insight.analyze(input) {
                Ok(findings) => {
                    tracing::debug!(
                        insight = insight.id().as_str(),
                        count = findings.len(),
                        "Insight analysis complete"
                    );
                    all_findings.extend(findings);
                }
                Err(e) => {
                    tracing::warn!(
                        insight = insight.id().as_str(),
                        error = %e,
                        "Insight analysis failed"
                    );
                }
            }
        }

        // Stable: findings of equal severity keep analyzer order
        all_findings.sort_by(|a, b| b.severity.priority().cmp(&a.severity.priority()));

        all_findings
    }

    /// Get list of registered insight types
    pub fn insight_types(&self) -> Vec<InsightType> {
        self.insights.iter().map(|i| i.id()).collect()
    }
}
