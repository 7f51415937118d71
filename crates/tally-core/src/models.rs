//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A user known to the record store
///
/// Identity lives with the hosted authentication provider; this row only
/// maps the provider's subject to a local id so expenses can be keyed by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Subject identifier issued by the authentication provider
    pub external_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile fields supplied by the authentication provider on first sight
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

/// Fixed category labels offered when recording an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Shopping,
    Bills,
    Healthcare,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transportation => "Transportation",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Healthcare => "Healthcare",
            Self::Other => "Other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Transportation,
            Self::Entertainment,
            Self::Shopping,
            Self::Bills,
            Self::Healthcare,
            Self::Other,
        ]
    }

    /// Map free text (typically model output) onto the fixed label set.
    ///
    /// Matching is case-insensitive and ignores surrounding quotes and
    /// punctuation. Anything unrecognised becomes `Other`.
    pub fn normalize(label: &str) -> Self {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
            .trim();
        cleaned.parse().unwrap_or(Self::Other)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "transportation" | "transport" => Ok(Self::Transportation),
            "entertainment" => Ok(Self::Entertainment),
            "shopping" => Ok(Self::Shopping),
            "bills" => Ok(Self::Bills),
            "healthcare" | "health" => Ok(Self::Healthcare),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logged expense belonging to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub owner_id: i64,
    pub description: String,
    pub amount: f64,
    pub category: String,
    /// Timestamp whose UTC calendar date is the day the expense happened
    pub occurred_on: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Calendar date of the expense, read in UTC so it never shifts with
    /// the reader's timezone
    pub fn calendar_date(&self) -> NaiveDate {
        self.occurred_on.date_naive()
    }
}

/// A validated expense ready to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub occurred_on: DateTime<Utc>,
}

/// Biggest and smallest single expense over a user's whole history
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseExtremes {
    pub highest: f64,
    pub lowest: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_normalize() {
        assert_eq!(Category::normalize("Food"), Category::Food);
        assert_eq!(Category::normalize("  \"shopping\". "), Category::Shopping);
        assert_eq!(Category::normalize("Transport"), Category::Transportation);
        assert_eq!(Category::normalize("Groceries and stuff"), Category::Other);
        assert_eq!(Category::normalize(""), Category::Other);
    }

    #[test]
    fn test_category_round_trip_labels() {
        for category in Category::all() {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
        }
    }

    #[test]
    fn test_calendar_date_ignores_time_of_day() {
        let record = ExpenseRecord {
            id: 1,
            owner_id: 1,
            description: "Late dinner".to_string(),
            amount: 42.0,
            category: "Food".to_string(),
            occurred_on: "2024-03-09T23:59:59Z".parse().unwrap(),
            created_at: Utc::now(),
        };
        assert_eq!(
            record.calendar_date(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
    }
}
