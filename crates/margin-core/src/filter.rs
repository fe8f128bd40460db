//! Record filters: free-text search and exact category selection
//!
//! The two filters are deliberately different. Search is a case-insensitive
//! substring match over a per-kind field set; the category filter is an
//! exact token match, because posting group codes double as dropdown keys.

use std::collections::BTreeSet;

use crate::models::{CategoryMarginRecord, CustomerMarginRecord, ItemMarginRecord};

/// Records that can be matched by the search box
pub trait Searchable {
    /// Fields the search term is matched against; `None` entries are skipped
    fn search_fields(&self) -> Vec<Option<&str>>;
}

impl Searchable for ItemMarginRecord {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(&self.item_code), Some(&self.description)]
    }
}

impl Searchable for CustomerMarginRecord {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(&self.customer_code),
            self.search_name.as_deref(),
            Some(&self.customer_name),
        ]
    }
}

/// Whether `record` matches the search `term`
///
/// Blank terms match everything.
pub fn matches<T: Searchable>(record: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    matches_normalized(record, &needle)
}

fn matches_normalized<T: Searchable>(record: &T, needle: &str) -> bool {
    record
        .search_fields()
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Records matching `term`, in input order
pub fn filter_by_search<T: Searchable + Clone>(records: &[T], term: &str) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| matches_normalized(*r, &needle))
        .cloned()
        .collect()
}

/// Categories whose posting group equals `selected` exactly
///
/// `None` returns every category unchanged.
pub fn filter_by_category(
    categories: &[CategoryMarginRecord],
    selected: Option<&str>,
) -> Vec<CategoryMarginRecord> {
    match selected {
        None => categories.to_vec(),
        Some(code) => categories
            .iter()
            .filter(|c| c.posting_group == code)
            .cloned()
            .collect(),
    }
}

/// Options for the category dropdown: unique posting groups, sorted
pub fn category_options(categories: &[CategoryMarginRecord]) -> Vec<String> {
    categories
        .iter()
        .map(|c| c.posting_group.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<ItemMarginRecord> {
        vec![
            ItemMarginRecord::new("X1", "Hex bolt", 1.0, 10.0, 8.0),
            ItemMarginRecord::new("Y2", "Washer", 1.0, 10.0, 8.0),
            ItemMarginRecord::new("Z3", "Xenon lamp", 1.0, 10.0, 8.0),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = items();
        assert!(matches(&items[0], "x1"));
        assert!(matches(&items[0], "HEX"));
        assert!(!matches(&items[1], "x1"));
    }

    #[test]
    fn test_search_matches_any_configured_field() {
        let result = filter_by_search(&items(), "x");
        let codes: Vec<&str> = result.iter().map(|i| i.item_code.as_str()).collect();
        // X1 by code, Z3 by description ("Xenon"), Y2 not at all
        assert_eq!(codes, vec!["X1", "Z3"]);
    }

    #[test]
    fn test_blank_term_matches_everything() {
        assert_eq!(filter_by_search(&items(), "").len(), 3);
        assert_eq!(filter_by_search(&items(), "   ").len(), 3);
    }

    #[test]
    fn test_term_is_trimmed() {
        assert_eq!(filter_by_search(&items(), "  washer ").len(), 1);
    }

    #[test]
    fn test_search_is_idempotent() {
        let once = filter_by_search(&items(), "x");
        let twice = filter_by_search(&once, "x");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_customer_missing_search_name_is_skipped() {
        let plain = CustomerMarginRecord::new("C1", "Acme Corp", 1.0, 1.0, 1.0);
        assert!(matches(&plain, "acme"));
        assert!(matches(&plain, "c1"));

        let nicknamed = CustomerMarginRecord::new("C2", "Beta Holdings", 1.0, 1.0, 1.0)
            .with_search_name("BETTY");
        assert!(matches(&nicknamed, "betty"));
        assert!(matches(&nicknamed, "holdings"));
        assert!(!matches(&nicknamed, "acme"));
    }

    #[test]
    fn test_category_filter_exact_match() {
        let categories = vec![
            CategoryMarginRecord::new("A", 1.0, 1.0, 1.0),
            CategoryMarginRecord::new("B", 1.0, 1.0, 1.0),
            CategoryMarginRecord::new("AB", 1.0, 1.0, 1.0),
        ];
        let selected = filter_by_category(&categories, Some("A"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].posting_group, "A");

        // No case folding
        assert!(filter_by_category(&categories, Some("a")).is_empty());
    }

    #[test]
    fn test_category_filter_none_is_identity() {
        let categories = vec![
            CategoryMarginRecord::new("B", 1.0, 1.0, 1.0),
            CategoryMarginRecord::new("A", 1.0, 1.0, 1.0),
        ];
        assert_eq!(filter_by_category(&categories, None), categories);
    }

    #[test]
    fn test_category_options_unique_and_sorted() {
        let categories = vec![
            CategoryMarginRecord::new("TOOLS", 1.0, 1.0, 1.0),
            CategoryMarginRecord::new("BOLTS", 1.0, 1.0, 1.0),
            CategoryMarginRecord::new("TOOLS", 1.0, 1.0, 1.0),
        ];
        assert_eq!(category_options(&categories), vec!["BOLTS", "TOOLS"]);
    }

    #[test]
    fn test_filters_accept_empty_input() {
        let empty: Vec<ItemMarginRecord> = vec![];
        assert!(filter_by_search(&empty, "x").is_empty());
        assert!(filter_by_category(&[], Some("A")).is_empty());
        assert!(category_options(&[]).is_empty());
    }
}
