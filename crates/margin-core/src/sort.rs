//! Single-field sorting with click-to-toggle state
//!
//! Sorting is stable and never mutates its input. Absent values (missing
//! optional text, non-finite numbers) compare lower than any present value,
//! so they come first ascending and last descending.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{CategoryMarginRecord, CustomerMarginRecord, ItemMarginRecord};

/// Column a table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// item_code, customer_code or posting_group
    Code,
    /// description, customer display name or category description
    Name,
    Quantity,
    Sales,
    Cost,
    Margin,
    MarginPercent,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Code => "code",
            SortField::Name => "name",
            SortField::Quantity => "quantity",
            SortField::Sales => "sales",
            SortField::Cost => "cost",
            SortField::Margin => "margin",
            SortField::MarginPercent => "margin_percent",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" | "item_code" | "customer_code" | "posting_group" => Ok(SortField::Code),
            "name" | "description" | "customer_name" | "search_name" | "category_description" => {
                Ok(SortField::Name)
            }
            "quantity" | "total_quantity" => Ok(SortField::Quantity),
            "sales" | "total_sales" => Ok(SortField::Sales),
            "cost" | "total_cost" => Ok(SortField::Cost),
            "margin" => Ok(SortField::Margin),
            "margin_percent" | "percent" | "margin%" => Ok(SortField::MarginPercent),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

/// Active sort column and direction for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::MarginPercent,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Direction a newly selected column starts with
    pub const DEFAULT_DIRECTION: SortDirection = SortDirection::Desc;

    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header click: same column flips, another column starts descending
    pub fn click(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = Self::DEFAULT_DIRECTION;
        }
    }

    pub fn apply<T: Sortable + Clone>(&self, records: &[T]) -> Vec<T> {
        sort_records(records, self.field, self.direction)
    }
}

/// Comparable value extracted from a record for one field
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Number(f64),
    Text(String),
}

impl SortKey {
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            SortKey::Number(value)
        } else {
            SortKey::Missing
        }
    }

    pub fn text(value: Option<&str>) -> Self {
        match value {
            Some(s) => SortKey::Text(s.to_lowercase()),
            None => SortKey::Missing,
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
            (SortKey::Missing, _) => Ordering::Less,
            (_, SortKey::Missing) => Ordering::Greater,
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            // Never produced for the same field
            _ => Ordering::Equal,
        }
    }
}

/// Records that expose a key per sortable field
pub trait Sortable {
    fn sort_key(&self, field: SortField) -> SortKey;
}

impl Sortable for ItemMarginRecord {
    fn sort_key(&self, field: SortField) -> SortKey {
        match field {
            SortField::Code => SortKey::text(Some(&self.item_code)),
            SortField::Name => SortKey::text(Some(&self.description)),
            SortField::Quantity => SortKey::number(self.total_quantity),
            SortField::Sales => SortKey::number(self.total_sales),
            SortField::Cost => SortKey::number(self.total_cost),
            SortField::Margin => SortKey::number(self.margin),
            SortField::MarginPercent => SortKey::number(self.margin_percent),
        }
    }
}

impl Sortable for CustomerMarginRecord {
    fn sort_key(&self, field: SortField) -> SortKey {
        match field {
            SortField::Code => SortKey::text(Some(&self.customer_code)),
            SortField::Name => {
                let name = self
                    .search_name
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .or_else(|| Some(self.customer_name.as_str()).filter(|s| !s.trim().is_empty()));
                SortKey::text(name)
            }
            SortField::Quantity => SortKey::number(self.total_quantity),
            SortField::Sales => SortKey::number(self.total_sales),
            SortField::Cost => SortKey::number(self.total_cost),
            SortField::Margin => SortKey::number(self.margin),
            SortField::MarginPercent => SortKey::number(self.margin_percent),
        }
    }
}

impl Sortable for CategoryMarginRecord {
    fn sort_key(&self, field: SortField) -> SortKey {
        match field {
            SortField::Code => SortKey::text(Some(&self.posting_group)),
            SortField::Name => SortKey::text(self.category_description.as_deref()),
            SortField::Quantity => SortKey::number(self.total_quantity),
            SortField::Sales => SortKey::number(self.total_sales),
            SortField::Cost => SortKey::number(self.total_cost),
            SortField::Margin => SortKey::number(self.margin),
            SortField::MarginPercent => SortKey::number(self.margin_percent),
        }
    }
}

/// Sort a copy of `records`; equal keys keep their input order
pub fn sort_records<T: Sortable + Clone>(
    records: &[T],
    field: SortField,
    direction: SortDirection,
) -> Vec<T> {
    sort_owned(records.to_vec(), field, direction)
}

/// Stable sort of an owned vector
pub fn sort_owned<T: Sortable>(
    mut records: Vec<T>,
    field: SortField,
    direction: SortDirection,
) -> Vec<T> {
    // Keys are extracted once per record instead of once per comparison
    let mut keyed: Vec<(SortKey, T)> = records
        .drain(..)
        .map(|r| (r.sort_key(field), r))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match direction {
        SortDirection::Asc => a.compare(b),
        SortDirection::Desc => b.compare(a),
    });

    keyed.into_iter().map(|(_, r)| r).collect()
}
