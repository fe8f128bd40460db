//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod bands;
pub mod export;
pub mod margin;

// Re-export all handlers for use in router
pub use bands::*;
pub use export::*;
pub use margin::*;
