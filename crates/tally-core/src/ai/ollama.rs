//! Ollama backend implementation
//!
//! HTTP client for a self-hosted Ollama server's `/api/generate` endpoint.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Category;
use crate::prompts::{PromptId, PromptLibrary, RenderedPrompt};

use super::parsing::{parse_answer, parse_category, parse_insights};
use super::types::{ExpenseSummary, Insight};
use super::{expenses_json, render_prompt, AIBackend};

/// Ollama backend
///
/// ```text
/// export AI_BACKEND=ollama
/// export OLLAMA_HOST="http://localhost:11434"
/// export OLLAMA_MODEL="llama3.2"
/// ```
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_prompts(base_url, model, PromptLibrary::new())
    }

    /// Create with an explicit prompt library
    pub fn with_prompts(base_url: &str, model: &str, prompts: PromptLibrary) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(prompts)),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `OLLAMA_HOST`
    /// Optional: `OLLAMA_MODEL` (default: llama3.2)
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }

    async fn generate(&self, prompt: RenderedPrompt) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.user,
            system: prompt.system,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AiUnavailable(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }
}

/// Request to Ollama's generate endpoint
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
}

/// Response from Ollama's generate endpoint
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl AIBackend for OllamaBackend {
    async fn suggest_category(&self, description: &str) -> Result<Category> {
        let mut vars = HashMap::new();
        vars.insert("description", description);
        let prompt = render_prompt(&self.prompts, PromptId::CategorizeExpense, &vars)?;

        let response = self.generate(prompt).await?;
        debug!("Ollama categorize response: {}", response);

        parse_category(&response)
    }

    async fn generate_insights(&self, expenses: &[ExpenseSummary]) -> Result<Vec<Insight>> {
        let data = expenses_json(expenses)?;
        let mut vars = HashMap::new();
        vars.insert("expenses", data.as_str());
        let prompt = render_prompt(&self.prompts, PromptId::ExpenseInsights, &vars)?;

        let response = self.generate(prompt).await?;
        debug!("Ollama insights response: {}", response);

        parse_insights(&response)
    }

    async fn answer_question(&self, question: &str, expenses: &[ExpenseSummary]) -> Result<String> {
        let data = expenses_json(expenses)?;
        let mut vars = HashMap::new();
        vars.insert("question", question);
        vars.insert("expenses", data.as_str());
        let prompt = render_prompt(&self.prompts, PromptId::InsightAnswer, &vars)?;

        let response = self.generate(prompt).await?;
        debug!("Ollama answer response: {}", response);

        parse_answer(&response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockModelServer;

    fn backend(server: &MockModelServer) -> OllamaBackend {
        OllamaBackend::with_prompts(&server.url(), "llama3.2", PromptLibrary::embedded_only())
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn test_request_omits_missing_system() {
        let request = GenerateRequest {
            model: "llama3.2".into(),
            prompt: "hi".into(),
            system: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["stream"], false);
    }

    #[tokio::test]
    async fn test_suggest_category() {
        let server = MockModelServer::start(r#"{"category": "Food"}"#).await;
        let category = backend(&server).suggest_category("Lunch").await.unwrap();
        assert_eq!(category, Category::Food);
    }

    #[tokio::test]
    async fn test_generate_insights() {
        let server = MockModelServer::start(
            r#"[{"type": "success", "title": "On track", "message": "Spending is below last month."}]"#,
        )
        .await;
        let summaries = vec![ExpenseSummary {
            id: 1,
            amount: 12.0,
            category: "Food".into(),
            description: "Lunch".into(),
            date: "2024-01-01".into(),
        }];

        let insights = backend(&server).generate_insights(&summaries).await.unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "ai-1");
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockModelServer::start("ok").await;
        assert!(backend(&server).health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = OllamaBackend::new("http://127.0.0.1:1", "llama3.2");
        assert!(!backend.health_check().await);
    }

    #[tokio::test]
    async fn test_server_error_is_ai_unavailable() {
        let server = MockModelServer::failing().await;
        let err = backend(&server).suggest_category("Lunch").await.unwrap_err();
        assert!(matches!(err, Error::AiUnavailable(_)));
    }
}
