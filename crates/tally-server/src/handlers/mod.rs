//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod auth;
pub mod expenses;
pub mod export;
pub mod insights;
pub mod stats;

// Re-export all handlers for use in router
pub use audit::*;
pub use auth::*;
pub use expenses::*;
pub use export::*;
pub use insights::*;
pub use stats::*;
