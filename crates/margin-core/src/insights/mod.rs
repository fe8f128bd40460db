//! Margin insights - the analysis collaborator behind the insights tab
//!
//! Analyzers receive the full mode-aware dataset and report findings that a
//! front end can list next to the tables and charts.
//!
//! ## Built-in Insight Types
//!
//! - **Negative Margin** - Items or customers sold below cost
//! - **Low Margin Items** - Selling items in the Low band
//! - **Credit Memo Impact** - Margin lost to credit memos
//! - **Category Concentration** - One posting group dominating sales
//!
//! ## Usage
//!
//! ```rust,ignore
//! use margin_core::insights::{InsightEngine, InsightsInput};
//!
//! let engine = InsightEngine::new();
//! let input = InsightsInput::from_dataset(&dataset, ViewMode::Adjusted);
//! let findings = engine.analyze_all(&input);
//! ```

pub mod category_concentration;
pub mod credit_memo_impact;
pub mod engine;
pub mod low_margin_items;
pub mod negative_margin;
pub mod types;

pub use category_concentration::CategoryConcentrationInsight;
pub use credit_memo_impact::CreditMemoImpactInsight;
pub use engine::{Insight, InsightEngine};
pub use low_margin_items::LowMarginItemsInsight;
pub use negative_margin::NegativeMarginInsight;
pub use types::{Finding, InsightType, InsightsInput, Severity};
