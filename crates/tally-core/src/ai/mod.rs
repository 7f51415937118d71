//! Pluggable AI backend abstraction
//!
//! - `AIBackend` trait: the operations every backend provides
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backends: `OpenAICompatibleBackend` (hosted chat-completions APIs),
//!   `OllamaBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: openai_compatible (default), ollama, or mock
//! - `OPENAI_COMPATIBLE_HOST`, `OPENAI_COMPATIBLE_MODEL`, `OPENAI_COMPATIBLE_API_KEY`
//! - `OLLAMA_HOST`, `OLLAMA_MODEL`

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Category;
use crate::prompts::{PromptId, PromptLibrary, RenderedPrompt};

/// Interface for all AI backends
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Map an expense description onto the fixed category set
    async fn suggest_category(&self, description: &str) -> Result<Category>;

    /// Produce commentary on a set of recent expenses
    async fn generate_insights(&self, expenses: &[ExpenseSummary]) -> Result<Vec<Insight>>;

    /// Answer a free-form question about a set of expenses
    async fn answer_question(&self, question: &str, expenses: &[ExpenseSummary]) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    fn model(&self) -> &str;

    fn host(&self) -> &str;
}

/// Concrete AI client enum
#[derive(Clone)]
pub enum AIClient {
    /// Any OpenAI chat-completions compatible API
    OpenAICompatible(OpenAICompatibleBackend),
    Ollama(OllamaBackend),
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None if the selected backend's host variable is not set.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());

        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "openrouter" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to openai_compatible");
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
        }
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a client whose operations all fail
    pub fn failing_mock() -> Self {
        AIClient::Mock(MockBackend::failing())
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn suggest_category(&self, description: &str) -> Result<Category> {
        match self {
            AIClient::OpenAICompatible(b) => b.suggest_category(description).await,
            AIClient::Ollama(b) => b.suggest_category(description).await,
            AIClient::Mock(b) => b.suggest_category(description).await,
        }
    }

    async fn generate_insights(&self, expenses: &[ExpenseSummary]) -> Result<Vec<Insight>> {
        match self {
            AIClient::OpenAICompatible(b) => b.generate_insights(expenses).await,
            AIClient::Ollama(b) => b.generate_insights(expenses).await,
            AIClient::Mock(b) => b.generate_insights(expenses).await,
        }
    }

    async fn answer_question(&self, question: &str, expenses: &[ExpenseSummary]) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.answer_question(question, expenses).await,
            AIClient::Ollama(b) => b.answer_question(question, expenses).await,
            AIClient::Mock(b) => b.answer_question(question, expenses).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Ollama(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Ollama(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// Render a prompt from a shared library
pub(crate) fn render_prompt(
    prompts: &RwLock<PromptLibrary>,
    id: PromptId,
    vars: &HashMap<&str, &str>,
) -> Result<RenderedPrompt> {
    let mut prompts = prompts
        .write()
        .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
    prompts.render(id, vars)
}

/// Serialize expense summaries for inclusion in a prompt
pub(crate) fn expenses_json(expenses: &[ExpenseSummary]) -> Result<String> {
    Ok(serde_json::to_string_pretty(expenses)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        assert!(AIClient::mock().health_check().await);
        assert!(!AIClient::failing_mock().health_check().await);
    }

    #[tokio::test]
    async fn test_client_delegates_to_backend() {
        let client = AIClient::mock();
        let category = client.suggest_category("Pharmacy refill").await.unwrap();
        assert_eq!(category, Category::Healthcare);
    }

    #[test]
    fn test_expenses_json_uses_summary_fields() {
        let json = expenses_json(&[ExpenseSummary {
            id: 3,
            amount: 9.5,
            category: "Food".into(),
            description: "Bagel".into(),
            date: "2024-02-01".into(),
        }])
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["description"], "Bagel");
        assert_eq!(value[0]["date"], "2024-02-01");
    }
}
