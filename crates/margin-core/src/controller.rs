//! Tab composition controller
//!
//! Owns the presentation selections (active tab, search term, category,
//! top-N, view mode, per-table sort) and composes the view for the active
//! tab from an immutable dataset. Composition is a pure function of the
//! controller state and the dataset; nothing is cached between calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::band::{classify, Band};
use crate::chart::{project, ChartDatum};
use crate::error::{Error, Result};
use crate::filter::{category_options, filter_by_category, filter_by_search, Searchable};
use crate::insights::{Finding, InsightEngine, InsightsInput};
use crate::models::{
    CategoryMarginRecord, CustomerMarginRecord, ItemMarginRecord, MarginRecord,
    ProcessedMarginDataset, RecordKind,
};
use crate::sort::{SortDirection, SortField, SortState, Sortable};
use crate::top_n::{TopN, TOP_N_CHOICES};
use crate::view_mode::{active_customers, active_items, active_overall, OverallView, ViewMode};

/// Number of items shown on the summary tab
pub const SUMMARY_ITEM_LIMIT: usize = 10;

/// Presentation tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Summary,
    Items,
    Customers,
    Categories,
    Chart,
    Insights,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Summary,
        Tab::Items,
        Tab::Customers,
        Tab::Categories,
        Tab::Chart,
        Tab::Insights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Summary => "summary",
            Tab::Items => "items",
            Tab::Customers => "customers",
            Tab::Categories => "categories",
            Tab::Chart => "chart",
            Tab::Insights => "insights",
        }
    }

    /// Tabs that render a sortable table
    pub fn is_table(&self) -> bool {
        matches!(self, Tab::Items | Tab::Customers | Tab::Categories)
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" | "overview" => Ok(Tab::Summary),
            "items" | "item" => Ok(Tab::Items),
            "customers" | "customer" => Ok(Tab::Customers),
            "categories" | "category" => Ok(Tab::Categories),
            "chart" | "charts" => Ok(Tab::Chart),
            "insights" | "insight" => Ok(Tab::Insights),
            _ => Err(format!("Unknown tab: {}", s)),
        }
    }
}

/// A table row together with the band of its margin percent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandedRow<T> {
    #[serde(flatten)]
    pub record: T,
    pub band: Band,
    pub color: &'static str,
}

impl<T: MarginRecord> BandedRow<T> {
    pub fn new(record: T) -> Self {
        let band = classify(record.margin_percent());
        Self {
            record,
            band,
            color: band.color(),
        }
    }
}

fn banded<T: MarginRecord>(records: Vec<T>) -> Vec<BandedRow<T>> {
    records.into_iter().map(BandedRow::new).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub overall: Option<OverallView>,
    pub top_items: Vec<BandedRow<ItemMarginRecord>>,
    pub has_adjusted_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView<T> {
    pub sort: SortState,
    /// Absent for tables that are never truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<TopN>,
    pub rows: Vec<BandedRow<T>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    /// Table whose pipeline feeds the chart
    pub source_tab: Tab,
    /// Record family of the charted rows; `kind` is taken by the view tag
    pub record_kind: RecordKind,
    pub data: Vec<ChartDatum>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsView {
    pub input: InsightsInput,
    pub findings: Vec<Finding>,
}

/// Payload for the active tab
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TabView {
    /// No dataset yet and a fetch is in flight
    Loading,
    Summary(SummaryView),
    Items(TableView<ItemMarginRecord>),
    Customers(TableView<CustomerMarginRecord>),
    Categories(TableView<CategoryMarginRecord>),
    Chart(ChartView),
    Insights(InsightsView),
}

/// Everything a front end needs to render the active tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedView {
    pub tab: Tab,
    pub view_mode: ViewMode,
    pub loading: bool,
    pub search: String,
    pub category: Option<String>,
    pub top_n: TopN,
    /// Values for the top-N selector
    pub top_n_choices: Vec<TopN>,
    pub category_options: Vec<String>,
    /// Records in the tab's source before search or category filtering
    pub total_count: usize,
    /// Records left after filtering, before top-N truncation
    pub filtered_count: usize,
    pub view: TabView,
}

struct Pipeline<T> {
    rows: Vec<T>,
    total: usize,
    filtered: usize,
}

/// Search, then sort, then truncate
fn table_pipeline<T>(records: &[T], search: &str, sort: SortState, top_n: TopN) -> Pipeline<T>
where
    T: Searchable + Sortable + Clone,
{
    let filtered = filter_by_search(records, search);
    let filtered_len = filtered.len();
    let sorted = crate::sort::sort_owned(filtered, sort.field, sort.direction);
    Pipeline {
        rows: top_n.apply_owned(sorted),
        total: records.len(),
        filtered: filtered_len,
    }
}

/// Category filter, then sort; categories are never truncated
fn category_pipeline(
    categories: &[CategoryMarginRecord],
    selected: Option<&str>,
    sort: SortState,
) -> Pipeline<CategoryMarginRecord> {
    let filtered = filter_by_category(categories, selected);
    let filtered_len = filtered.len();
    Pipeline {
        rows: crate::sort::sort_owned(filtered, sort.field, sort.direction),
        total: categories.len(),
        filtered: filtered_len,
    }
}

/// String-typed selections as they arrive from a query string or flags
///
/// Unset fields leave the controller untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ViewParams {
    pub tab: Option<String>,
    pub mode: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub top_n: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    /// Table whose pipeline feeds the chart tab
    pub chart_of: Option<String>,
}

fn parse_param<T: FromStr<Err = String>>(value: Option<&str>) -> Result<Option<T>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(Error::InvalidParameter))
        .transpose()
}

impl ViewParams {
    /// Apply the selections in transition order
    ///
    /// Tab changes happen before the category is set so that the
    /// leave-categories reset never clears a category passed alongside.
    /// A category passed with any other tab is ignored.
    pub fn apply(&self, controller: &mut TabController) -> Result<()> {
        let tab: Option<Tab> = parse_param(self.tab.as_deref())?;
        let mode: Option<ViewMode> = parse_param(self.mode.as_deref())?;
        let sort: Option<SortField> = parse_param(self.sort.as_deref())?;
        let direction: Option<SortDirection> = parse_param(self.direction.as_deref())?;
        let chart_of: Option<Tab> = parse_param(self.chart_of.as_deref())?;

        if let Some(source) = chart_of {
            if !source.is_table() {
                return Err(Error::InvalidParameter(format!(
                    "chart source must be a table tab, got {}",
                    source
                )));
            }
            controller.select_tab(source);
        }

        let tab = tab.unwrap_or(controller.active_tab());
        let sort_target = if tab.is_table() {
            tab
        } else {
            controller.last_table_tab()
        };
        if sort.is_some() || direction.is_some() {
            let current = controller.sort_state(sort_target).unwrap_or_default();
            let state = match (sort, direction) {
                (Some(field), Some(direction)) => SortState::new(field, direction),
                (Some(field), None) if field != current.field => {
                    SortState::new(field, SortState::DEFAULT_DIRECTION)
                }
                (Some(field), None) => SortState::new(field, current.direction),
                (None, Some(direction)) => SortState::new(current.field, direction),
                (None, None) => current,
            };
            controller.set_sort(sort_target, state);
        }

        controller.select_tab(tab);

        if let Some(mode) = mode {
            controller.set_view_mode(mode);
        }
        if let Some(top_n) = self.top_n.as_deref() {
            controller.set_top_n(top_n.parse::<TopN>().unwrap_or_default());
        }
        if let Some(search) = &self.search {
            controller.set_search(search.clone());
        }
        if let Some(category) = &self.category {
            controller.select_category(Some(category.trim().to_string()));
        }
        Ok(())
    }
}

/// Presentation state for one analysis screen
#[derive(Debug, Clone, PartialEq)]
pub struct TabController {
    active_tab: Tab,
    search: String,
    category: Option<String>,
    top_n: TopN,
    view_mode: ViewMode,
    item_sort: SortState,
    customer_sort: SortState,
    category_sort: SortState,
    last_table_tab: Tab,
}

impl Default for TabController {
    fn default() -> Self {
        Self::new()
    }
}

impl TabController {
    pub fn new() -> Self {
        Self {
            active_tab: Tab::Summary,
            search: String::new(),
            category: None,
            top_n: TopN::All,
            view_mode: ViewMode::Standard,
            item_sort: SortState::default(),
            customer_sort: SortState::default(),
            category_sort: SortState::default(),
            last_table_tab: Tab::Items,
        }
    }

    /// Controller starting on the given tab, mode and top-N
    pub fn with_defaults(tab: Tab, view_mode: ViewMode, top_n: TopN) -> Self {
        let mut controller = Self::new();
        controller.view_mode = view_mode;
        controller.top_n = top_n;
        controller.select_tab(tab);
        controller
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn top_n(&self) -> TopN {
        self.top_n
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Table tab whose pipeline the chart shows
    pub fn last_table_tab(&self) -> Tab {
        self.last_table_tab
    }

    /// Sort state of a table tab
    pub fn sort_state(&self, tab: Tab) -> Option<SortState> {
        match tab {
            Tab::Items => Some(self.item_sort),
            Tab::Customers => Some(self.customer_sort),
            Tab::Categories => Some(self.category_sort),
            _ => None,
        }
    }

    fn sort_state_mut(&mut self, tab: Tab) -> Option<&mut SortState> {
        match tab {
            Tab::Items => Some(&mut self.item_sort),
            Tab::Customers => Some(&mut self.customer_sort),
            Tab::Categories => Some(&mut self.category_sort),
            _ => None,
        }
    }

    /// Switch tabs; leaving the categories tab clears the category selection
    pub fn select_tab(&mut self, tab: Tab) {
        if self.active_tab == Tab::Categories && tab != Tab::Categories && self.category.is_some()
        {
            tracing::debug!(to = tab.as_str(), "Leaving categories, clearing category filter");
            self.category = None;
        }
        if tab.is_table() {
            self.last_table_tab = tab;
        }
        self.active_tab = tab;
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// `None` or an empty code selects all categories
    ///
    /// Only the categories tab holds a selection; on any other tab this is
    /// ignored and returns `false`.
    pub fn select_category(&mut self, category: Option<String>) -> bool {
        if self.active_tab != Tab::Categories {
            tracing::debug!(
                tab = self.active_tab.as_str(),
                "Category selection outside the categories tab ignored"
            );
            return false;
        }
        self.category = category.filter(|c| !c.is_empty());
        true
    }

    pub fn set_top_n(&mut self, top_n: TopN) {
        self.top_n = top_n;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Header click on the active table
    ///
    /// Returns `false` when the active tab has no table.
    pub fn click_sort(&mut self, field: SortField) -> bool {
        let tab = self.active_tab;
        match self.sort_state_mut(tab) {
            Some(state) => {
                state.click(field);
                true
            }
            None => false,
        }
    }

    /// Replace a table's sort state outright
    pub fn set_sort(&mut self, tab: Tab, sort: SortState) -> bool {
        match self.sort_state_mut(tab) {
            Some(state) => {
                *state = sort;
                true
            }
            None => false,
        }
    }

    /// Compose the active tab without an insights analyzer
    pub fn compose(&self, dataset: Option<&ProcessedMarginDataset>, loading: bool) -> ComposedView {
        self.compose_with(dataset, loading, None)
    }

    /// Compose the active tab; `engine` fills the insights findings
    pub fn compose_with(
        &self,
        dataset: Option<&ProcessedMarginDataset>,
        loading: bool,
        engine: Option<&InsightEngine>,
    ) -> ComposedView {
        let empty;
        let dataset = match dataset {
            Some(dataset) => dataset,
            None if loading => return self.loading_view(),
            None => {
                empty = ProcessedMarginDataset::empty();
                &empty
            }
        };

        let mode = self.view_mode;
        let (total, filtered, view) = match self.active_tab {
            Tab::Summary => {
                let items = active_items(dataset, mode);
                let top_items: Vec<ItemMarginRecord> =
                    items.iter().take(SUMMARY_ITEM_LIMIT).cloned().collect();
                let view = TabView::Summary(SummaryView {
                    overall: active_overall(dataset, mode),
                    top_items: banded(top_items),
                    has_adjusted_data: dataset.has_adjusted_data(),
                });
                (items.len(), items.len(), view)
            }
            Tab::Items => {
                let p = self.items_pipeline(dataset);
                let view = TabView::Items(TableView {
                    sort: self.item_sort,
                    top_n: Some(self.top_n),
                    rows: banded(p.rows),
                });
                (p.total, p.filtered, view)
            }
            Tab::Customers => {
                let p = self.customers_pipeline(dataset);
                let view = TabView::Customers(TableView {
                    sort: self.customer_sort,
                    top_n: Some(self.top_n),
                    rows: banded(p.rows),
                });
                (p.total, p.filtered, view)
            }
            Tab::Categories => {
                let p = self.categories_pipeline(dataset);
                let view = TabView::Categories(TableView {
                    sort: self.category_sort,
                    top_n: None,
                    rows: banded(p.rows),
                });
                (p.total, p.filtered, view)
            }
            Tab::Chart => self.chart_view(dataset),
            Tab::Insights => {
                let input = InsightsInput::from_dataset(dataset, mode);
                let findings = engine.map(|e| e.analyze_all(&input)).unwrap_or_default();
                let count = input.items.len();
                (count, count, TabView::Insights(InsightsView { input, findings }))
            }
        };

        tracing::debug!(
            tab = self.active_tab.as_str(),
            mode = mode.as_str(),
            total,
            filtered,
            "Composed view"
        );

        ComposedView {
            tab: self.active_tab,
            view_mode: mode,
            loading,
            search: self.search.clone(),
            category: self.category.clone(),
            top_n: self.top_n,
            top_n_choices: TOP_N_CHOICES.to_vec(),
            category_options: category_options(&dataset.categories),
            total_count: total,
            filtered_count: filtered,
            view,
        }
    }

    fn loading_view(&self) -> ComposedView {
        ComposedView {
            tab: self.active_tab,
            view_mode: self.view_mode,
            loading: true,
            search: self.search.clone(),
            category: self.category.clone(),
            top_n: self.top_n,
            top_n_choices: TOP_N_CHOICES.to_vec(),
            category_options: vec![],
            total_count: 0,
            filtered_count: 0,
            view: TabView::Loading,
        }
    }

    fn items_pipeline(&self, dataset: &ProcessedMarginDataset) -> Pipeline<ItemMarginRecord> {
        table_pipeline(
            active_items(dataset, self.view_mode),
            &self.search,
            self.item_sort,
            self.top_n,
        )
    }

    fn customers_pipeline(
        &self,
        dataset: &ProcessedMarginDataset,
    ) -> Pipeline<CustomerMarginRecord> {
        table_pipeline(
            active_customers(dataset, self.view_mode),
            &self.search,
            self.customer_sort,
            self.top_n,
        )
    }

    fn categories_pipeline(
        &self,
        dataset: &ProcessedMarginDataset,
    ) -> Pipeline<CategoryMarginRecord> {
        category_pipeline(
            &dataset.categories,
            self.category.as_deref(),
            self.category_sort,
        )
    }

    fn chart_view(&self, dataset: &ProcessedMarginDataset) -> (usize, usize, TabView) {
        let (total, filtered, kind, data) = match self.last_table_tab {
            Tab::Customers => {
                let p = self.customers_pipeline(dataset);
                (p.total, p.filtered, RecordKind::Customer, project(&p.rows))
            }
            Tab::Categories => {
                let p = self.categories_pipeline(dataset);
                (p.total, p.filtered, RecordKind::Category, project(&p.rows))
            }
            _ => {
                let p = self.items_pipeline(dataset);
                (p.total, p.filtered, RecordKind::Item, project(&p.rows))
            }
        };
        let view = TabView::Chart(ChartView {
            source_tab: self.last_table_tab,
            record_kind: kind,
            data,
        });
        (total, filtered, view)
    }
}
