//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Margin Lens - Inspect monthly sales margins by item, customer and category
#[derive(Parser)]
#[command(name = "margin")]
#[command(about = "Margin analysis reporting engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.local/share/margin-lens/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Dataset source: aggregation service URL or a directory of YYYY-MM.json files
    ///
    /// Overrides the configured service URL and data directory.
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Period and scope selection shared by dataset commands
#[derive(Args, Debug, Clone)]
pub struct PeriodArgs {
    /// Year (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Month 1-12 (defaults to the current month)
    #[arg(long)]
    pub month: Option<u32>,

    /// Restrict the dataset to one category (passed to the aggregation service)
    #[arg(long)]
    pub scope_category: Option<String>,

    /// Restrict the dataset to one salesperson (passed to the aggregation service)
    #[arg(long)]
    pub salesperson: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show one tab of the margin analysis
    View {
        #[command(flatten)]
        period: PeriodArgs,

        /// Tab: summary, items, customers, categories, chart, insights
        #[arg(short, long)]
        tab: Option<String>,

        /// View mode: standard or adjusted (credit-memo aware)
        #[arg(short, long)]
        mode: Option<String>,

        /// Search items or customers by code or name
        #[arg(short, long)]
        search: Option<String>,

        /// Posting group to show on the categories tab
        #[arg(long)]
        category: Option<String>,

        /// Show only the top N records (5, 10, 20, 50, 100 or all)
        #[arg(long)]
        top: Option<String>,

        /// Sort column: code, name, quantity, sales, cost, margin, margin_percent
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction: asc or desc
        #[arg(long)]
        direction: Option<String>,

        /// Chart source table when --tab chart (items, customers, categories)
        #[arg(long)]
        chart_of: Option<String>,

        /// Print the composed view as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the posting groups available for the category filter
    Categories {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Show the margin band legend
    Bands,

    /// Export the gross items, customers and categories for a period
    Export {
        #[command(flatten)]
        period: PeriodArgs,

        /// Export format: csv or json (defaults to the configured format)
        #[arg(short, long)]
        format: Option<String>,

        /// Output directory (defaults to the configured export dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
