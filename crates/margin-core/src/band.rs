//! Margin band classification
//!
//! Every surface that displays a margin percentage (table cells, chart bars,
//! the summary indicator) colors it through [`classify`], so a given
//! percentage always lands in the same band everywhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the High band
pub const HIGH_THRESHOLD: f64 = 28.0;

/// Lower bound (inclusive) of the Medium band
pub const MEDIUM_THRESHOLD: f64 = 20.0;

/// Lower bound (inclusive) of the MediumLow band
pub const MEDIUM_LOW_THRESHOLD: f64 = 15.0;

/// Discrete margin band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    MediumLow,
    Medium,
    High,
}

impl Band {
    /// All bands, highest first
    pub const ALL: [Band; 4] = [Band::High, Band::Medium, Band::MediumLow, Band::Low];

    /// Numeric rank (higher = better margin)
    pub fn rank(&self) -> u8 {
        match self {
            Band::Low => 0,
            Band::MediumLow => 1,
            Band::Medium => 2,
            Band::High => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::High => "high",
            Band::Medium => "medium",
            Band::MediumLow => "medium_low",
            Band::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::High => "High",
            Band::Medium => "Medium",
            Band::MediumLow => "Medium-Low",
            Band::Low => "Low",
        }
    }

    /// Display color token shared by tables, charts and summary cards
    pub fn color(&self) -> &'static str {
        match self {
            Band::High => "green",
            Band::Medium => "blue",
            Band::MediumLow => "orange",
            Band::Low => "red",
        }
    }

    /// Half-open `[lower, upper)` range covered by this band
    pub fn range(&self) -> (Option<f64>, Option<f64>) {
        match self {
            Band::High => (Some(HIGH_THRESHOLD), None),
            Band::Medium => (Some(MEDIUM_THRESHOLD), Some(HIGH_THRESHOLD)),
            Band::MediumLow => (Some(MEDIUM_LOW_THRESHOLD), Some(MEDIUM_THRESHOLD)),
            Band::Low => (None, Some(MEDIUM_LOW_THRESHOLD)),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map a margin percentage to its band
///
/// Total over all inputs; NaN compares false against every threshold and
/// lands in Low.
pub fn classify(margin_percent: f64) -> Band {
    if margin_percent >= HIGH_THRESHOLD {
        Band::High
    } else if margin_percent >= MEDIUM_THRESHOLD {
        Band::Medium
    } else if margin_percent >= MEDIUM_LOW_THRESHOLD {
        Band::MediumLow
    } else {
        Band::Low
    }
}

/// One legend entry for UI and CLI display
#[derive(Debug, Clone, Serialize)]
pub struct BandLegendEntry {
    pub band: Band,
    pub label: &'static str,
    pub color: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Legend for all bands, highest first
pub fn legend() -> Vec<BandLegendEntry> {
    Band::ALL
        .iter()
        .map(|band| {
            let (min, max) = band.range();
            BandLegendEntry {
                band: *band,
                label: band.label(),
                color: band.color(),
                min,
                max,
            }
        })
        .collect()
}
