//! Integration tests for tally-core
//!
//! These tests exercise the full form → store → aggregate workflow and the
//! best-effort AI actions against the mock backend.

use chrono::NaiveDate;
use tally_core::{
    aggregate::{bucket_by_day, chart_points, compute_summary, SpendingTier},
    ai::AIClient,
    db::Database,
    insights,
    models::UserProfile,
    validation::{ExpenseForm, ValidationError},
};

fn form(description: &str, amount: &str, category: &str, date: &str) -> ExpenseForm {
    ExpenseForm {
        description: Some(description.to_string()),
        amount: Some(amount.to_string()),
        category: Some(category.to_string()),
        date: Some(date.to_string()),
    }
}

// =============================================================================
// Record → Bucket Workflow
// =============================================================================

#[test]
fn test_form_to_chart_workflow() {
    let db = Database::in_memory().expect("Failed to create test database");
    let user = db
        .get_or_create_user("user_workflow", &UserProfile::default())
        .unwrap();

    for f in [
        form("Groceries", "10", "Food", "2024-03-01"),
        form("Bus pass", "30", "Transportation", "2024-03-01"),
        form("Concert", "120.50", "Entertainment", "2024-03-03"),
        form("Rent", "250", "Bills", "2024-03-02"),
    ] {
        let expense = f.validate().expect("form should validate");
        db.create_expense(user.id, &expense).unwrap();
    }

    let records = db.list_expenses(user.id, None, None).unwrap();
    assert_eq!(records.len(), 4);

    let buckets = bucket_by_day(&records);
    let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        ]
    );
    assert!((buckets[0].total - 40.0).abs() < 1e-9);
    assert_eq!(buckets[0].categories.len(), 2);

    let summary = compute_summary(&records);
    assert_eq!(summary.active_days, 3);
    assert!((summary.total - 410.5).abs() < 1e-9);
    assert!((summary.max_amount - 250.0).abs() < 1e-9);
    assert!((summary.min_amount - 10.0).abs() < 1e-9);

    let points = chart_points(&buckets);
    let tiers: Vec<SpendingTier> = points.iter().map(|p| p.tier).collect();
    assert_eq!(
        tiers,
        vec![SpendingTier::Low, SpendingTier::High, SpendingTier::Medium]
    );
}

#[test]
fn test_invalid_forms_never_reach_the_store() {
    let db = Database::in_memory().unwrap();
    let user = db
        .get_or_create_user("user_invalid", &UserProfile::default())
        .unwrap();

    let bad = [
        form("", "5", "Food", "2024-01-01"),
        form("Lunch", "-5", "Food", "2024-01-01"),
        form("Lunch", "five", "Food", "2024-01-01"),
        form("Lunch", "5", "Food", "01/02/2024"),
    ];

    for f in &bad {
        assert!(f.validate().is_err());
    }
    assert_eq!(bad[3].validate(), Err(ValidationError::InvalidDate));
    assert_eq!(db.count_expenses(user.id).unwrap(), 0);
}

// =============================================================================
// AI Actions
// =============================================================================

#[tokio::test]
async fn test_insight_actions_with_mock_backend() {
    let db = Database::in_memory().unwrap();
    let user = db
        .get_or_create_user("user_ai", &UserProfile::default())
        .unwrap();
    let ai = AIClient::mock();

    let welcome = insights::expense_insights(&db, Some(&ai), user.id).await;
    assert_eq!(welcome.len(), 2);
    assert_eq!(welcome[0].title, "Welcome to ExpenseTracker AI!");

    let expense = form("Dinner out", "45", "Food", "2024-05-05").validate().unwrap();
    db.create_expense(user.id, &expense).unwrap();

    let generated = insights::expense_insights(&db, Some(&ai), user.id).await;
    assert!(generated.iter().all(|i| i.id.starts_with("ai-")));

    let suggestion = insights::suggest_category(Some(&ai), "Dinner out").await;
    assert_eq!(suggestion.category, "Food");

    let answer =
        insights::answer_insight_question(&db, None, user.id, "How much on food?").await;
    assert_eq!(answer, insights::ANSWER_UNAVAILABLE);
}
