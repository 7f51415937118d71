//! Mock backend for testing
//!
//! Deterministic responses computed from the input, so tests and local
//! development work without a model server.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Category;

use super::types::{ExpenseSummary, Insight, InsightKind};
use super::AIBackend;

/// Mock AI backend
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Make every AI operation fail with `AiUnavailable`
    pub failing: bool,
}

impl MockBackend {
    /// Create a healthy mock backend
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing: false,
        }
    }

    /// Create a mock whose operations all fail, as an unreachable provider would
    pub fn failing() -> Self {
        Self {
            healthy: false,
            failing: true,
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(Error::AiUnavailable("Mock backend configured to fail".into()));
        }
        Ok(())
    }
}

/// Totals per category, largest first
fn category_totals(expenses: &[ExpenseSummary]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
    }

    let mut totals: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(category, total)| (category.to_string(), total))
        .collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn suggest_category(&self, description: &str) -> Result<Category> {
        self.check()?;

        let lower = description.to_lowercase();
        let matches = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let category = if matches(&["lunch", "dinner", "coffee", "grocer", "restaurant", "pizza"]) {
            Category::Food
        } else if matches(&["uber", "taxi", "bus", "train", "gas", "fuel", "parking"]) {
            Category::Transportation
        } else if matches(&["movie", "cinema", "netflix", "concert", "game"]) {
            Category::Entertainment
        } else if matches(&["amazon", "clothes", "shoes", "store"]) {
            Category::Shopping
        } else if matches(&["rent", "electric", "water", "internet", "phone bill"]) {
            Category::Bills
        } else if matches(&["doctor", "pharmacy", "dentist", "medicine"]) {
            Category::Healthcare
        } else {
            Category::Other
        };

        Ok(category)
    }

    async fn generate_insights(&self, expenses: &[ExpenseSummary]) -> Result<Vec<Insight>> {
        self.check()?;

        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        let mut insights = vec![Insight {
            id: "ai-1".to_string(),
            kind: InsightKind::Info,
            title: "Spending Overview".to_string(),
            message: format!(
                "You logged {} expenses totalling ${:.2} recently.",
                expenses.len(),
                total
            ),
            action: None,
            confidence: Some(0.9),
        }];

        if let Some((category, amount)) = category_totals(expenses).into_iter().next() {
            let share = if total > 0.0 { amount / total * 100.0 } else { 0.0 };
            let kind = if share > 50.0 {
                InsightKind::Warning
            } else {
                InsightKind::Tip
            };
            insights.push(Insight {
                id: "ai-2".to_string(),
                kind,
                title: format!("Top Category: {}", category),
                message: format!("{} accounts for {:.0}% of your spending.", category, share),
                action: Some(format!("Review your {} expenses", category)),
                confidence: Some(0.8),
            });
        }

        Ok(insights)
    }

    async fn answer_question(&self, question: &str, expenses: &[ExpenseSummary]) -> Result<String> {
        self.check()?;

        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        let top = category_totals(expenses)
            .into_iter()
            .next()
            .map(|(category, amount)| format!(" Your largest category is {} (${:.2}).", category, amount))
            .unwrap_or_default();

        Ok(format!(
            "You asked: \"{}\". Across {} expenses you spent ${:.2}.{}",
            question.trim(),
            expenses.len(),
            total,
            top
        ))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(amount: f64, category: &str) -> ExpenseSummary {
        ExpenseSummary {
            id: 1,
            amount,
            category: category.to_string(),
            description: "x".to_string(),
            date: "2024-01-01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_suggest_category() {
        let mock = MockBackend::new();
        assert_eq!(mock.suggest_category("Uber ride").await.unwrap(), Category::Transportation);
        assert_eq!(mock.suggest_category("Team lunch").await.unwrap(), Category::Food);
        assert_eq!(mock.suggest_category("Misc").await.unwrap(), Category::Other);
    }

    #[tokio::test]
    async fn test_mock_insights_flag_dominant_category() {
        let mock = MockBackend::new();
        let insights = mock
            .generate_insights(&[summary(80.0, "Food"), summary(20.0, "Bills")])
            .await
            .unwrap();

        assert_eq!(insights.len(), 2);
        assert_eq!(insights[1].id, "ai-2");
        assert_eq!(insights[1].kind, InsightKind::Warning);
        assert!(insights[1].message.contains("80%"));
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing();
        assert!(!mock.health_check().await);
        assert!(matches!(
            mock.suggest_category("Lunch").await,
            Err(Error::AiUnavailable(_))
        ));
        assert!(mock.generate_insights(&[]).await.is_err());
        assert!(mock.answer_question("?", &[]).await.is_err());
    }
}
