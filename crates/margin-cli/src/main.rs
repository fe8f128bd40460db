//! Margin Lens CLI - margin analysis reporting engine
//!
//! Usage:
//!   margin view --year 2024 --month 3 --tab items    Show a tab of the analysis
//!   margin categories --year 2024 --month 3          List category filter options
//!   margin export --year 2024 --month 3 --format csv Export the gross arrays
//!   margin serve --port 3000                         Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.source.as_deref())?;

    match cli.command {
        Commands::View {
            period,
            tab,
            mode,
            search,
            category,
            top,
            sort,
            direction,
            chart_of,
            json,
        } => {
            let params = margin_core::ViewParams {
                tab,
                mode,
                search,
                category,
                top_n: top,
                sort,
                direction,
                chart_of,
            };
            commands::cmd_view(&config, &period, &params, json).await
        }
        Commands::Categories { period } => commands::cmd_categories(&config, &period).await,
        Commands::Bands => commands::cmd_bands(),
        Commands::Export {
            period,
            format,
            output,
        } => commands::cmd_export(&config, &period, format.as_deref(), output.as_deref()).await,
        Commands::Serve { port, host } => commands::cmd_serve(&config, &host, port).await,
    }
}
