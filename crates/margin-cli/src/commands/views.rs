//! View command implementations (view, categories, bands)

use anyhow::{Context, Result};
use margin_core::{
    category_options, legend, Band, BandedRow, CategoryMarginRecord, ChartView, ComposedView,
    CustomerMarginRecord, InsightEngine, InsightsView, ItemMarginRecord, MarginConfig,
    MarginRecord, Severity, SummaryView, TabController, TabView, TableView, ViewParams,
};

use super::{dataset_query, fetch_dataset, truncate};
use crate::cli::PeriodArgs;

/// Controller from configured defaults with the command-line selections applied
pub fn build_controller(config: &MarginConfig, params: &ViewParams) -> Result<TabController> {
    let mut controller = config.controller();
    params.apply(&mut controller)?;
    Ok(controller)
}

pub async fn cmd_view(
    config: &MarginConfig,
    period: &PeriodArgs,
    params: &ViewParams,
    json: bool,
) -> Result<()> {
    let query = dataset_query(period)?;
    let controller = build_controller(config, params)?;
    let dataset = fetch_dataset(config, &query).await?;

    let engine = InsightEngine::new();
    let view = controller.compose_with(Some(&dataset), false, Some(&engine));

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view).context("Failed to serialize view")?
        );
        return Ok(());
    }

    println!();
    println!(
        "📊 Margin Analysis - {} {} ({} view)",
        query.period.month_name(),
        query.period.year(),
        view.view_mode
    );
    println!("   ─────────────────────────────────────────────────────────────");
    print_view(&view);
    Ok(())
}

pub fn print_view(view: &ComposedView) {
    match &view.view {
        TabView::Loading => println!("   Loading..."),
        TabView::Summary(summary) => print_summary(summary),
        TabView::Items(table) => {
            print_filter_line(view);
            print_items(table);
        }
        TabView::Customers(table) => {
            print_filter_line(view);
            print_customers(table);
        }
        TabView::Categories(table) => {
            print_filter_line(view);
            print_categories(table);
        }
        TabView::Chart(chart) => print_chart(chart),
        TabView::Insights(insights) => print_insights(insights),
    }
}

fn print_filter_line(view: &ComposedView) {
    let mut parts = vec![];
    if !view.search.trim().is_empty() {
        parts.push(format!("search \"{}\"", view.search.trim()));
    }
    if let Some(category) = &view.category {
        parts.push(format!("category {}", category));
    }
    parts.push(format!("top {}", view.top_n));
    println!(
        "   {} of {} records ({})",
        view.filtered_count,
        view.total_count,
        parts.join(", ")
    );
    println!();
}

/// ANSI color for a band's display color token
fn band_ansi(band: Band) -> &'static str {
    match band {
        Band::High => "\x1b[32m",
        Band::Medium => "\x1b[34m",
        Band::MediumLow => "\x1b[33m",
        Band::Low => "\x1b[31m",
    }
}

fn band_marker(band: Band) -> String {
    format!("{}●\x1b[0m", band_ansi(band))
}

fn print_summary(summary: &SummaryView) {
    match &summary.overall {
        Some(overall) => {
            println!("   Total sales:  {:>14.2}", overall.total_sales);
            println!("   Total cost:   {:>14.2}", overall.total_cost);
            println!(
                "   Margin:       {:>14.2}  {:>6.1}% {} {}",
                overall.margin,
                overall.margin_percent,
                band_marker(overall.band),
                overall.band.label()
            );
            if overall.adjusted {
                println!(
                    "   Gross margin: {:>21.1}%  (before credit memos)",
                    overall.gross_margin_percent
                );
            }
            if let Some(amount) = overall.credit_memo_amount {
                println!(
                    "   Credit memos: {:>14.2}  ({} memos)",
                    amount,
                    overall
                        .total_credit_memos
                        .map(|n| format!("{:.0}", n))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        None => println!("   No overall figures for this period."),
    }

    if !summary.has_adjusted_data {
        println!("   \x1b[2mNo credit-memo adjusted data for this period\x1b[0m");
    }

    println!();
    println!("   Top items");
    print_items_rows(&summary.top_items);
}

fn print_items(table: &TableView<ItemMarginRecord>) {
    println!("   Sorted by {} {}", table.sort.field, table.sort.direction);
    print_items_rows(&table.rows);
}

fn print_items_rows(rows: &[BandedRow<ItemMarginRecord>]) {
    if rows.is_empty() {
        println!("   No items found.");
        return;
    }
    println!(
        "   {:12} │ {:28} │ {:>9} │ {:>12} │ {:>12} │ {:>7}",
        "Item", "Description", "Qty", "Sales", "Margin", "%"
    );
    println!(
        "   ─────────────┼──────────────────────────────┼───────────┼──────────────┼──────────────┼─────────"
    );
    for row in rows {
        let r = &row.record;
        println!(
            "   {:12} │ {:28} │ {:>9.1} │ {:>12.2} │ {:>12.2} │ {:>6.1}% {}",
            truncate(&r.item_code, 12),
            truncate(r.display_name(), 28),
            r.total_quantity,
            r.total_sales,
            r.margin,
            r.margin_percent,
            band_marker(row.band)
        );
    }
}

fn print_customers(table: &TableView<CustomerMarginRecord>) {
    println!("   Sorted by {} {}", table.sort.field, table.sort.direction);
    if table.rows.is_empty() {
        println!("   No customers found.");
        return;
    }
    println!(
        "   {:10} │ {:30} │ {:>12} │ {:>12} │ {:>7}",
        "Customer", "Name", "Sales", "Margin", "%"
    );
    println!("   ───────────┼────────────────────────────────┼──────────────┼──────────────┼─────────");
    for row in &table.rows {
        let r = &row.record;
        println!(
            "   {:10} │ {:30} │ {:>12.2} │ {:>12.2} │ {:>6.1}% {}",
            truncate(&r.customer_code, 10),
            truncate(r.display_name(), 30),
            r.total_sales,
            r.margin,
            r.margin_percent,
            band_marker(row.band)
        );
    }
}

fn print_categories(table: &TableView<CategoryMarginRecord>) {
    println!("   Sorted by {} {}", table.sort.field, table.sort.direction);
    if table.rows.is_empty() {
        println!("   No categories found.");
        return;
    }
    println!(
        "   {:12} │ {:24} │ {:>12} │ {:>12} │ {:>7}",
        "Group", "Description", "Sales", "Margin", "%"
    );
    println!("   ─────────────┼──────────────────────────┼──────────────┼──────────────┼─────────");
    for row in &table.rows {
        let r = &row.record;
        println!(
            "   {:12} │ {:24} │ {:>12.2} │ {:>12.2} │ {:>6.1}% {}",
            truncate(&r.posting_group, 12),
            truncate(r.category_description.as_deref().unwrap_or(""), 24),
            r.total_sales,
            r.margin,
            r.margin_percent,
            band_marker(row.band)
        );
    }
}

/// Horizontal bars scaled to the largest absolute margin percent
fn print_chart(chart: &ChartView) {
    println!("   Margin % by {} (top {})", chart.record_kind, chart.data.len());
    println!();
    if chart.data.is_empty() {
        println!("   Nothing to chart.");
        return;
    }

    const WIDTH: f64 = 40.0;
    let max = chart
        .data
        .iter()
        .map(|d| d.value.abs())
        .fold(0.0_f64, f64::max);

    for datum in &chart.data {
        let len = if max > 0.0 {
            ((datum.value.abs() / max) * WIDTH).round() as usize
        } else {
            0
        };
        println!(
            "   {:14} {:>6.1}% {}",
            truncate(&datum.category, 14),
            datum.value,
            band_bar(datum.band, len)
        );
    }
}

fn band_bar(band: Band, len: usize) -> String {
    format!("{}{}\x1b[0m", band_ansi(band), "█".repeat(len))
}

fn print_insights(insights: &InsightsView) {
    if insights.findings.is_empty() {
        println!("   ✅ Nothing stands out this period.");
        return;
    }
    for finding in &insights.findings {
        let icon = match finding.severity {
            Severity::Alert => "🚨",
            Severity::Warning => "⚠️ ",
            Severity::Attention => "👀",
            Severity::Info => "💡",
        };
        println!("   {} {} - {}", icon, finding.title, finding.summary);
        if let Some(detail) = &finding.detail {
            println!("      {}", detail);
        }
    }
}

pub async fn cmd_categories(config: &MarginConfig, period: &PeriodArgs) -> Result<()> {
    let query = dataset_query(period)?;
    let dataset = fetch_dataset(config, &query).await?;
    let options = category_options(&dataset.categories);

    println!();
    println!(
        "🏷️  Categories - {} {}",
        query.period.month_name(),
        query.period.year()
    );
    println!("   ─────────────────────────────");
    if options.is_empty() {
        println!("   No categories in this period.");
        return Ok(());
    }
    for option in options {
        println!("   {}", option);
    }
    Ok(())
}

pub fn cmd_bands() -> Result<()> {
    println!();
    println!("🎨 Margin Bands");
    println!("   ─────────────────────────────");
    for entry in legend() {
        let range = match (entry.min, entry.max) {
            (Some(min), Some(max)) => format!("{:.0}% to <{:.0}%", min, max),
            (Some(min), None) => format!("{:.0}% and above", min),
            (None, Some(max)) => format!("below {:.0}%", max),
            (None, None) => "any".to_string(),
        };
        println!(
            "   {} {:11} {:7} {}",
            band_marker(entry.band),
            entry.label,
            entry.color,
            range
        );
    }
    Ok(())
}
