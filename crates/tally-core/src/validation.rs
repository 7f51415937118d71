//! Boundary validation for expense form input
//!
//! Form fields arrive as loosely typed text. `ExpenseForm::validate` turns
//! them into a `NewExpense` or a `ValidationError` without panicking.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::models::NewExpense;

/// Reasons an expense form is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Text, amount, category, or date is missing")]
    Missing,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date format")]
    InvalidDate,
}

/// Raw expense form as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseForm {
    /// Free-text description (`text` in the web form)
    #[serde(alias = "text")]
    pub description: Option<String>,
    /// Amount as typed; JSON numbers are accepted too
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: Option<String>,
    pub category: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub date: Option<String>,
}

impl ExpenseForm {
    pub fn validate(&self) -> Result<NewExpense, ValidationError> {
        let description = required(&self.description)?;
        let amount_raw = required(&self.amount)?;
        let category = required(&self.category)?;
        let date_raw = required(&self.date)?;

        let amount = parse_amount(amount_raw)?;
        let occurred_on = parse_expense_date(date_raw)?;

        Ok(NewExpense {
            description: description.to_string(),
            amount,
            category: category.to_string(),
            occurred_on,
        })
    }
}

fn required(field: &Option<String>) -> Result<&str, ValidationError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::Missing)
}

fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    let amount: f64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(raw.to_string()))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::InvalidAmount(raw.to_string()));
    }
    Ok(amount)
}

/// Parse a submitted expense date.
///
/// A bare `YYYY-MM-DD` is pinned to 12:00 UTC of that day so the stored
/// calendar date survives any later timezone conversion. Full timestamps are
/// converted to UTC as given.
pub fn parse_expense_date(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).ok_or(ValidationError::InvalidDate)?;
        return Ok(date.and_time(noon).and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidDate)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(description: &str, amount: &str, category: &str, date: &str) -> ExpenseForm {
        ExpenseForm {
            description: Some(description.to_string()),
            amount: Some(amount.to_string()),
            category: Some(category.to_string()),
            date: Some(date.to_string()),
        }
    }

    #[test]
    fn test_valid_form() {
        let expense = form("  Coffee beans ", "12.50", "Food", "2024-02-29")
            .validate()
            .unwrap();
        assert_eq!(expense.description, "Coffee beans");
        assert_eq!(expense.amount, 12.5);
        assert_eq!(expense.category, "Food");
        assert_eq!(
            expense.occurred_on.to_rfc3339(),
            "2024-02-29T12:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            form("", "1", "Food", "2024-01-01").validate(),
            Err(ValidationError::Missing)
        );
        assert_eq!(
            form("Lunch", "1", "   ", "2024-01-01").validate(),
            Err(ValidationError::Missing)
        );
        assert_eq!(
            ExpenseForm::default().validate(),
            Err(ValidationError::Missing)
        );
    }

    #[test]
    fn test_invalid_amount() {
        assert!(matches!(
            form("Lunch", "abc", "Food", "2024-01-01").validate(),
            Err(ValidationError::InvalidAmount(_))
        ));
        assert!(matches!(
            form("Lunch", "-5", "Food", "2024-01-01").validate(),
            Err(ValidationError::InvalidAmount(_))
        ));
        assert!(matches!(
            form("Lunch", "NaN", "Food", "2024-01-01").validate(),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_invalid_date() {
        assert_eq!(
            form("Lunch", "5", "Food", "2024-13-01").validate(),
            Err(ValidationError::InvalidDate)
        );
        assert_eq!(
            form("Lunch", "5", "Food", "yesterday").validate(),
            Err(ValidationError::InvalidDate)
        );
    }

    #[test]
    fn test_rfc3339_date_converted_to_utc() {
        let dt = parse_expense_date("2024-07-01T22:00:00-04:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-07-02T02:00:00+00:00");
    }

    #[test]
    fn test_json_form_accepts_numeric_amount() {
        let form: ExpenseForm = serde_json::from_value(serde_json::json!({
            "text": "Bus pass",
            "amount": 45.5,
            "category": "Transportation",
            "date": "2024-03-01"
        }))
        .unwrap();
        let expense = form.validate().unwrap();
        assert_eq!(expense.amount, 45.5);
        assert_eq!(expense.description, "Bus pass");
    }
}
