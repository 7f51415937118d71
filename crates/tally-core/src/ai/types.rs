//! AI backend request and response types
//!
//! These types are backend-agnostic and shared by every implementation.

use serde::{Deserialize, Serialize};

use crate::models::{Category, ExpenseRecord};

/// Compact view of an expense sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    pub description: String,
    /// Expense date as `YYYY-MM-DD`
    pub date: String,
}

impl From<&ExpenseRecord> for ExpenseSummary {
    fn from(record: &ExpenseRecord) -> Self {
        let category = if record.category.trim().is_empty() {
            Category::Other.as_str().to_string()
        } else {
            record.category.clone()
        };

        Self {
            id: record.id,
            amount: record.amount,
            category,
            description: record.description.clone(),
            date: record.calendar_date().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Tone of an insight card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Info,
    Success,
    Tip,
}

/// One piece of commentary about a user's spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Model confidence in 0.0..=1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_summary_defaults_blank_category() {
        let record = ExpenseRecord {
            id: 7,
            owner_id: 1,
            description: "Mystery".into(),
            amount: 4.5,
            category: "  ".into(),
            occurred_on: Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap(),
            created_at: Utc::now(),
        };

        let summary = ExpenseSummary::from(&record);
        assert_eq!(summary.category, "Other");
        assert_eq!(summary.date, "2024-05-06");
        assert_eq!(summary.id, 7);
    }

    #[test]
    fn test_insight_serializes_type_field() {
        let insight = Insight {
            id: "ai-1".into(),
            kind: InsightKind::Tip,
            title: "Cook at home".into(),
            message: "Food is your largest category.".into(),
            action: None,
            confidence: Some(0.8),
        };

        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "tip");
        assert!(json.get("action").is_none());
        assert_eq!(json["confidence"], 0.8);
    }
}
