//! Prompt library for the AI backends
//!
//! Prompts resolve in two layers:
//! 1. An override file in the data dir (`~/.local/share/tally/prompts/overrides/<id>.md`)
//! 2. The embedded default compiled into the binary
//!
//! Each prompt file starts with YAML frontmatter followed by `# System` and
//! `# User` sections. Variables use `{{name}}` placeholders.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

mod defaults {
    pub const CATEGORIZE_EXPENSE: &str = include_str!("../../../prompts/categorize_expense.md");
    pub const EXPENSE_INSIGHTS: &str = include_str!("../../../prompts/expense_insights.md");
    pub const INSIGHT_ANSWER: &str = include_str!("../../../prompts/insight_answer.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Map a free-text description to one category
    CategorizeExpense,
    /// Produce a list of insights from recent expenses
    ExpenseInsights,
    /// Answer a free-form question about recent expenses
    InsightAnswer,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategorizeExpense => "categorize_expense",
            Self::ExpenseInsights => "expense_insights",
            Self::InsightAnswer => "insight_answer",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[
            Self::CategorizeExpense,
            Self::ExpenseInsights,
            Self::InsightAnswer,
        ]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::CategorizeExpense => defaults::CATEGORIZE_EXPENSE,
            Self::ExpenseInsights => defaults::EXPENSE_INSIGHTS,
            Self::InsightAnswer => defaults::INSIGHT_ANSWER,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub version: u32,
    /// Kind of work the prompt asks for (fast_classification, reasoning, narrative)
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the frontmatter (system + user sections)
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

/// A prompt with its variables substituted, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render both sections with `{{var}}` placeholders replaced
    ///
    /// A prompt without a `# User` header is sent whole as the user message.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> RenderedPrompt {
        let user = self.user_section().unwrap_or(&self.content);
        RenderedPrompt {
            system: self.system_section().map(|s| substitute(s, vars)),
            user: substitute(user, vars),
        }
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a prompt library using the default override directory
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt {} not cached", id.as_str())))
    }

    /// Load and render a prompt in one step
    pub fn render(&mut self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<RenderedPrompt> {
        Ok(self.get(id)?.render(vars))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                tracing::debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_dir
            .as_ref()
            .is_some_and(|dir| dir.join(format!("{}.md", id.as_str())).exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("prompts").join("overrides"))
}

fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}

/// Split a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;

    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 2
task_type: fast_classification
---

# System
Test system prompt.

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 2);
        assert_eq!(metadata.task_type, "fast_classification");
        assert!(body.starts_with("# System"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# User\nhello").is_err());
        assert!(parse_prompt("---\nid: x\nversion: 1\n").is_err());
    }

    #[test]
    fn test_extract_section() {
        let content = "# System\nSystem content here.\n\n# User\nUser content here.";

        assert_eq!(
            extract_section(content, "# System"),
            Some("System content here.")
        );
        assert_eq!(extract_section(content, "# User"), Some("User content here."));
        assert_eq!(extract_section(content, "# Missing"), None);
    }

    #[test]
    fn test_render_substitutes_both_sections() {
        let mut lib = PromptLibrary::embedded_only();
        let mut vars = HashMap::new();
        vars.insert("description", "Uber to airport");

        let rendered = lib.render(PromptId::CategorizeExpense, &vars).unwrap();
        assert!(rendered.user.contains("\"Uber to airport\""));
        assert!(!rendered.user.contains("{{description}}"));
        assert!(rendered
            .system
            .as_deref()
            .is_some_and(|s| s.contains("Transportation")));
    }

    #[test]
    fn test_render_without_user_header_uses_whole_body() {
        let prompt = Prompt {
            metadata: PromptMetadata {
                id: "plain".into(),
                version: 1,
                task_type: "test".into(),
            },
            content: "Hello {{name}}".into(),
            is_override: false,
            override_path: None,
        };
        let mut vars = HashMap::new();
        vars.insert("name", "World");

        let rendered = prompt.render(&vars);
        assert_eq!(rendered.user, "Hello World");
        assert!(rendered.system.is_none());
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let (metadata, body) = parse_prompt(id.default_content()).unwrap();
            assert_eq!(metadata.id, id.as_str(), "Prompt ID mismatch");
            assert!(body.contains("# User"), "{} has no user section", id.as_str());
        }
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("insight_answer.md"),
            "---\nid: insight_answer\nversion: 9\ntask_type: narrative\n---\n\n# User\nCustom {{question}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::InsightAnswer));
        assert!(!lib.has_override(PromptId::ExpenseInsights));

        let prompt = lib.get(PromptId::InsightAnswer).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 9);

        let mut vars = HashMap::new();
        vars.insert("question", "why?");
        let rendered = lib.render(PromptId::InsightAnswer, &vars).unwrap();
        assert_eq!(rendered.user, "Custom why?");
    }
}
