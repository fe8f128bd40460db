//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config resolution, period parsing, dataset fetch)
//! - `views` - Tab views, category options and the band legend
//! - `export` - Export of the gross arrays to CSV or JSON
//! - `serve` - Web server command

pub mod core;
pub mod export;
pub mod serve;
pub mod views;

// Re-export command functions for main.rs
pub use core::*;
pub use export::*;
pub use serve::*;
pub use views::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
