//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API,
//! hosted (OpenRouter, OpenAI) or local (vLLM, LocalAI, llama-server).
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

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

/// OpenAI-compatible backend
///
/// ```text
/// export AI_BACKEND=openai_compatible
/// export OPENAI_COMPATIBLE_HOST="https://openrouter.ai/api"
/// export OPENAI_COMPATIBLE_MODEL="openai/gpt-4o-mini"
/// export OPENAI_COMPATIBLE_API_KEY="sk-..."
/// ```
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OpenAICompatibleBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_prompts(base_url, model, PromptLibrary::new())
    }

    /// Create with an explicit prompt library
    pub fn with_prompts(base_url: &str, model: &str, prompts: PromptLibrary) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            prompts: Arc::new(RwLock::new(prompts)),
        }
    }

    /// Attach a bearer API key
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Create from environment variables
    ///
    /// Required: `OPENAI_COMPATIBLE_HOST`
    /// Optional: `OPENAI_COMPATIBLE_MODEL` (default: gpt-4o-mini)
    /// Optional: `OPENAI_COMPATIBLE_API_KEY`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model = std::env::var("OPENAI_COMPATIBLE_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let backend = Self::new(&host, &model);
        match std::env::var("OPENAI_COMPATIBLE_API_KEY") {
            Ok(key) if !key.is_empty() => Some(backend.with_api_key(&key)),
            _ => Some(backend),
        }
    }

    async fn chat_completion(&self, prompt: RenderedPrompt) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = prompt.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.user,
        });

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.3),
            max_tokens: None,
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AiUnavailable(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::AiUnavailable("No response from OpenAI API".into()))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    // Null when a provider filters the completion
    content: Option<String>,
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn suggest_category(&self, description: &str) -> Result<Category> {
        let mut vars = HashMap::new();
        vars.insert("description", description);
        let prompt = render_prompt(&self.prompts, PromptId::CategorizeExpense, &vars)?;

        let response = self.chat_completion(prompt).await?;
        debug!("OpenAI-compatible categorize response: {}", response);

        parse_category(&response)
    }

    async fn generate_insights(&self, expenses: &[ExpenseSummary]) -> Result<Vec<Insight>> {
        let data = expenses_json(expenses)?;
        let mut vars = HashMap::new();
        vars.insert("expenses", data.as_str());
        let prompt = render_prompt(&self.prompts, PromptId::ExpenseInsights, &vars)?;

        let response = self.chat_completion(prompt).await?;
        debug!("OpenAI-compatible insights response: {}", response);

        parse_insights(&response)
    }

    async fn answer_question(&self, question: &str, expenses: &[ExpenseSummary]) -> Result<String> {
        let data = expenses_json(expenses)?;
        let mut vars = HashMap::new();
        vars.insert("question", question);
        vars.insert("expenses", data.as_str());
        let prompt = render_prompt(&self.prompts, PromptId::InsightAnswer, &vars)?;

        let response = self.chat_completion(prompt).await?;
        debug!("OpenAI-compatible answer response: {}", response);

        parse_answer(&response)
    }

    async fn health_check(&self) -> bool {
        // /v1/models is standard; some local servers only answer /health
        for path in ["/v1/models", "/health"] {
            let mut req = self.http_client.get(format!("{}{}", self.base_url, path));
            if let Some(ref api_key) = self.api_key {
                req = req.bearer_auth(api_key);
            }
            if let Ok(resp) = req.send().await {
                if resp.status().is_success() {
                    return true;
                }
            }
        }

        false
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
