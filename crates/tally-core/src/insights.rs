//! Best-effort AI actions
//!
//! Every function here returns a usable value even when the AI backend is
//! missing or failing, so callers can render the result directly. Failures
//! are logged and replaced with fixed fallback content.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ai::{AIBackend, AIClient, ExpenseSummary, Insight, InsightKind};
use crate::db::Database;
use crate::models::Category;

/// Insights look at expenses recorded in this many days
pub const INSIGHT_WINDOW_DAYS: i64 = 30;

/// Most records sent to the model per request
pub const INSIGHT_RECORD_LIMIT: i64 = 50;

pub const DESCRIPTION_TOO_SHORT: &str = "Description too short for AI analysis";
pub const SUGGESTION_UNAVAILABLE: &str = "Unable to suggest category at this time";
pub const ANSWER_UNAVAILABLE: &str = "I'm unable to provide a detailed answer at the moment. \
     Please try refreshing the insights or check your connection.";

/// Category suggested for a description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    /// Why the suggestion fell back to `Other`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategorySuggestion {
    fn fallback(reason: &str) -> Self {
        Self {
            category: Category::Other.as_str().to_string(),
            error: Some(reason.to_string()),
        }
    }
}

/// Suggest a category for an expense description
pub async fn suggest_category(ai: Option<&AIClient>, description: &str) -> CategorySuggestion {
    let description = description.trim();
    if description.chars().count() < 2 {
        return CategorySuggestion::fallback(DESCRIPTION_TOO_SHORT);
    }

    let Some(ai) = ai else {
        return CategorySuggestion::fallback(SUGGESTION_UNAVAILABLE);
    };

    match ai.suggest_category(description).await {
        Ok(category) => CategorySuggestion {
            category: category.as_str().to_string(),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, backend = ai.host(), "Category suggestion failed");
            CategorySuggestion::fallback(SUGGESTION_UNAVAILABLE)
        }
    }
}

/// Insights shown to a user with nothing recorded recently
pub fn welcome_insights() -> Vec<Insight> {
    vec![
        Insight {
            id: "welcome-1".to_string(),
            kind: InsightKind::Info,
            title: "Welcome to ExpenseTracker AI!".to_string(),
            message: "Start adding your expenses to get personalized AI insights about your \
                      spending patterns."
                .to_string(),
            action: Some("Add your first expense".to_string()),
            confidence: Some(1.0),
        },
        Insight {
            id: "welcome-2".to_string(),
            kind: InsightKind::Tip,
            title: "Track Regularly".to_string(),
            message: "For best results, try to log expenses daily. This helps our AI provide \
                      more accurate insights."
                .to_string(),
            action: Some("Set daily reminders".to_string()),
            confidence: Some(1.0),
        },
    ]
}

/// Single warning shown when insights cannot be produced
pub fn unavailable_insights() -> Vec<Insight> {
    vec![Insight {
        id: "error-1".to_string(),
        kind: InsightKind::Warning,
        title: "Insights Temporarily Unavailable".to_string(),
        message: "We're having trouble analyzing your expenses right now. Please try again in a \
                  few minutes."
            .to_string(),
        action: Some("Retry analysis".to_string()),
        confidence: Some(0.5),
    }]
}

/// Summaries of the user's recently recorded expenses
fn recent_summaries(db: &Database, owner_id: i64) -> crate::Result<Vec<ExpenseSummary>> {
    let since = Utc::now() - Duration::days(INSIGHT_WINDOW_DAYS);
    let records = db.list_recent_expenses(owner_id, Some(since), Some(INSIGHT_RECORD_LIMIT))?;
    Ok(records.iter().map(ExpenseSummary::from).collect())
}

/// Generate insights about a user's recent expenses
pub async fn expense_insights(db: &Database, ai: Option<&AIClient>, owner_id: i64) -> Vec<Insight> {
    let summaries = match recent_summaries(db, owner_id) {
        Ok(summaries) => summaries,
        Err(e) => {
            warn!(error = %e, owner_id, "Failed to load expenses for insights");
            return unavailable_insights();
        }
    };

    if summaries.is_empty() {
        return welcome_insights();
    }

    let Some(ai) = ai else {
        warn!("No AI backend configured; insights unavailable");
        return unavailable_insights();
    };

    match ai.generate_insights(&summaries).await {
        Ok(insights) => insights,
        Err(e) => {
            warn!(error = %e, owner_id, backend = ai.host(), "Insight generation failed");
            unavailable_insights()
        }
    }
}

/// Answer a free-form question about a user's recent expenses
pub async fn answer_insight_question(
    db: &Database,
    ai: Option<&AIClient>,
    owner_id: i64,
    question: &str,
) -> String {
    let question = question.trim();
    let Some(ai) = ai.filter(|_| !question.is_empty()) else {
        return ANSWER_UNAVAILABLE.to_string();
    };

    let summaries = match recent_summaries(db, owner_id) {
        Ok(summaries) => summaries,
        Err(e) => {
            warn!(error = %e, owner_id, "Failed to load expenses for question");
            return ANSWER_UNAVAILABLE.to_string();
        }
    };

    match ai.answer_question(question, &summaries).await {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, owner_id, backend = ai.host(), "Question answering failed");
            ANSWER_UNAVAILABLE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewExpense, UserProfile};
    use crate::validation::parse_expense_date;

    fn seeded_db() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user = db
            .get_or_create_user("user_insights", &UserProfile::default())
            .unwrap();
        (db, user.id)
    }

    fn add(db: &Database, owner_id: i64, description: &str, amount: f64, category: &str) {
        db.create_expense(
            owner_id,
            &NewExpense {
                description: description.to_string(),
                amount,
                category: category.to_string(),
                occurred_on: parse_expense_date("2024-06-01").unwrap(),
            },
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_suggest_category_short_description() {
        let ai = AIClient::mock();
        let suggestion = suggest_category(Some(&ai), " a ").await;
        assert_eq!(suggestion.category, "Other");
        assert_eq!(suggestion.error.as_deref(), Some(DESCRIPTION_TOO_SHORT));
    }

    #[tokio::test]
    async fn test_suggest_category_success() {
        let ai = AIClient::mock();
        let suggestion = suggest_category(Some(&ai), "Taxi home").await;
        assert_eq!(suggestion.category, "Transportation");
        assert!(suggestion.error.is_none());
    }

    #[tokio::test]
    async fn test_suggest_category_fallbacks() {
        let failing = AIClient::failing_mock();
        let suggestion = suggest_category(Some(&failing), "Taxi home").await;
        assert_eq!(suggestion.category, "Other");
        assert_eq!(suggestion.error.as_deref(), Some(SUGGESTION_UNAVAILABLE));

        let suggestion = suggest_category(None, "Taxi home").await;
        assert_eq!(suggestion.error.as_deref(), Some(SUGGESTION_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_insights_welcome_when_nothing_recent() {
        let (db, owner_id) = seeded_db();
        let insights = expense_insights(&db, Some(&AIClient::mock()), owner_id).await;

        assert_eq!(insights, welcome_insights());
        assert_eq!(insights[0].title, "Welcome to ExpenseTracker AI!");
        assert_eq!(insights[1].title, "Track Regularly");
    }

    #[tokio::test]
    async fn test_insights_from_backend() {
        let (db, owner_id) = seeded_db();
        add(&db, owner_id, "Groceries", 60.0, "Food");
        add(&db, owner_id, "Bus", 5.0, "Transportation");

        let insights = expense_insights(&db, Some(&AIClient::mock()), owner_id).await;
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].id, "ai-1");
        assert!(insights[1].title.contains("Food"));
    }

    #[tokio::test]
    async fn test_insights_unavailable_on_failure() {
        let (db, owner_id) = seeded_db();
        add(&db, owner_id, "Groceries", 60.0, "Food");

        let insights = expense_insights(&db, Some(&AIClient::failing_mock()), owner_id).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Warning);
        assert_eq!(insights[0].title, "Insights Temporarily Unavailable");
        assert_eq!(insights[0].confidence, Some(0.5));

        assert_eq!(expense_insights(&db, None, owner_id).await, unavailable_insights());
    }

    #[tokio::test]
    async fn test_answer_question() {
        let (db, owner_id) = seeded_db();
        add(&db, owner_id, "Rent", 900.0, "Bills");

        let answer =
            answer_insight_question(&db, Some(&AIClient::mock()), owner_id, "Where does it go?")
                .await;
        assert!(answer.contains("Bills"));
        assert!(answer.contains("900.00"));

        let fallback =
            answer_insight_question(&db, Some(&AIClient::failing_mock()), owner_id, "Why?").await;
        assert_eq!(fallback, ANSWER_UNAVAILABLE);

        let blank = answer_insight_question(&db, Some(&AIClient::mock()), owner_id, "  ").await;
        assert_eq!(blank, ANSWER_UNAVAILABLE);
    }
}
