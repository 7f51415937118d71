//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ai` - Categorization, insights and backend health
//! - `core` - Init and shared utilities (open_db, resolve_user)
//! - `expenses` - Add, list, stats, chart and export
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod ai;
pub mod core;
pub mod expenses;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use ai::*;
pub use core::*;
pub use expenses::*;
pub use prompts::*;
pub use serve::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
