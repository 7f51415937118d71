//! Tally Core Library
//!
//! Shared functionality for the Tally expense tracker:
//! - Expense models and input validation
//! - Per-day bucketing, summary statistics and chart data
//! - Database access with connection pooling and optional encryption
//! - Pluggable AI backends (OpenAI-compatible, Ollama) for categorization and insights
//! - Prompt library for customizable AI prompts
//! - CSV export

pub mod aggregate;
pub mod ai;
pub mod db;
pub mod error;
pub mod export;
pub mod insights;
pub mod models;
pub mod prompts;
pub mod validation;

/// Test utilities including a mock model server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{
    bucket_by_day, chart_points, compute_summary, ChartPoint, DailyBucket, SpendingTier,
    StatisticsSummary,
};
pub use ai::{
    AIBackend, AIClient, ExpenseSummary, Insight, InsightKind, MockBackend, OllamaBackend,
    OpenAICompatibleBackend,
};
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use export::{ExpenseExport, ExpenseExportOptions};
pub use insights::CategorySuggestion;
pub use models::{Category, ExpenseExtremes, ExpenseRecord, NewExpense, User, UserProfile};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use validation::{ExpenseForm, ValidationError};
