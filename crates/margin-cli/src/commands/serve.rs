//! Server command implementation

use anyhow::Result;
use margin_core::MarginConfig;

pub async fn cmd_serve(config: &MarginConfig, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting Margin Lens web server...");
    println!("   Source: {}", config.source_location());
    println!("   Listening: http://{}:{}", host, port);
    println!(
        "   Defaults: {} tab, {} view, top {}",
        config.defaults.tab, config.defaults.view_mode, config.defaults.top_n
    );
    println!();
    println!("   Press Ctrl+C to stop");

    margin_server::serve(config, host, port).await?;

    Ok(())
}
