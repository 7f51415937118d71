//! Parsing helpers for AI backend responses
//!
//! Models often wrap their JSON in prose or code fences, so these functions
//! locate the outermost JSON value before deserializing it.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::Category;

use super::types::{Insight, InsightKind};

const RAW_PREVIEW_LEN: usize = 200;

/// Shorten a raw response for error messages without splitting a character
fn preview(raw: &str) -> String {
    match raw.char_indices().nth(RAW_PREVIEW_LEN) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}

/// Slice from the first `open` to the last `close` delimiter
fn extract_json(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let end = response.rfind(close)?;
    (start < end).then(|| &response[start..=end])
}

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    category: String,
}

/// Parse a category suggestion
///
/// Accepts `{"category": "..."}` or a bare label. Labels outside the fixed
/// set become `Other`.
pub fn parse_category(response: &str) -> Result<Category> {
    let response = response.trim();
    if response.is_empty() {
        return Err(Error::InvalidData("Empty category response from AI".into()));
    }

    if let Some(json_str) = extract_json(response, '{', '}') {
        if let Ok(parsed) = serde_json::from_str::<CategoryResponse>(json_str) {
            return Ok(Category::normalize(&parsed.category));
        }
    }

    let first_line = response.lines().next().unwrap_or_default();
    let label = first_line
        .trim()
        .strip_prefix("Category:")
        .unwrap_or(first_line);
    Ok(Category::normalize(label))
}

/// Insight as the model returns it, before ids are assigned
#[derive(Debug, Deserialize)]
struct RawInsight {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WrappedInsights {
    insights: Vec<RawInsight>,
}

fn insight_kind(raw: Option<&str>) -> InsightKind {
    match raw.map(|k| k.trim().to_lowercase()).as_deref() {
        Some("warning") => InsightKind::Warning,
        Some("success") => InsightKind::Success,
        Some("tip") => InsightKind::Tip,
        _ => InsightKind::Info,
    }
}

/// Parse a list of insights and assign ids `ai-1..n`
///
/// Accepts a bare JSON array or an object with an `insights` array. Entries
/// without a title or message are dropped; confidence is clamped to 0..=1.
pub fn parse_insights(response: &str) -> Result<Vec<Insight>> {
    let response = response.trim();

    let raw: Vec<RawInsight> = match extract_json(response, '[', ']')
        .and_then(|json| serde_json::from_str(json).ok())
    {
        Some(list) => list,
        None => {
            let json_str = extract_json(response, '{', '}').ok_or_else(|| {
                Error::InvalidData(format!(
                    "No JSON found in AI insights response | Raw: {}",
                    preview(response)
                ))
            })?;
            let wrapped: WrappedInsights = serde_json::from_str(json_str).map_err(|e| {
                Error::InvalidData(format!(
                    "Invalid insights JSON from AI: {} | Raw: {}",
                    e,
                    preview(json_str)
                ))
            })?;
            wrapped.insights
        }
    };

    let insights: Vec<Insight> = raw
        .into_iter()
        .filter(|r| !r.title.trim().is_empty() && !r.message.trim().is_empty())
        .enumerate()
        .map(|(idx, r)| Insight {
            id: format!("ai-{}", idx + 1),
            kind: insight_kind(r.kind.as_deref()),
            title: r.title.trim().to_string(),
            message: r.message.trim().to_string(),
            action: r
                .action
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            confidence: r
                .confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0)),
        })
        .collect();

    if insights.is_empty() {
        return Err(Error::InvalidData("AI returned no usable insights".into()));
    }

    Ok(insights)
}

/// Parse a free-text answer
pub fn parse_answer(response: &str) -> Result<String> {
    let answer = response.trim();
    if answer.is_empty() {
        return Err(Error::InvalidData("Empty answer from AI".into()));
    }
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_json() {
        let response = "Sure! {\"category\": \"Transportation\"}";
        assert_eq!(parse_category(response).unwrap(), Category::Transportation);
    }

    #[test]
    fn test_parse_category_plain_text() {
        assert_eq!(parse_category("Food").unwrap(), Category::Food);
        assert_eq!(
            parse_category("Category: Healthcare\nBecause pharmacy.").unwrap(),
            Category::Healthcare
        );
    }

    #[test]
    fn test_parse_category_unknown_label() {
        assert_eq!(
            parse_category("{\"category\": \"Groceries & Dining\"}").unwrap(),
            Category::Other
        );
        assert!(parse_category("   ").is_err());
    }

    #[test]
    fn test_parse_insights_array() {
        let response = r#"Here you go:
```json
[
  {"type": "warning", "title": "Dining out", "message": "Food is 60% of spend.", "action": "Cook twice a week", "confidence": 0.9},
  {"type": "celebration", "title": "Steady", "message": "Spending is flat.", "confidence": 1.7}
]
```"#;

        let insights = parse_insights(response).unwrap();
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].id, "ai-1");
        assert_eq!(insights[0].kind, InsightKind::Warning);
        assert_eq!(insights[0].action.as_deref(), Some("Cook twice a week"));
        assert_eq!(insights[1].id, "ai-2");
        assert_eq!(insights[1].kind, InsightKind::Info);
        assert_eq!(insights[1].confidence, Some(1.0));
    }

    #[test]
    fn test_parse_insights_wrapped_object() {
        let response = r#"{"insights": [{"type": "tip", "title": "Budget", "message": "Set a weekly cap."}]}"#;
        let insights = parse_insights(response).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Tip);
        assert!(insights[0].confidence.is_none());
    }

    #[test]
    fn test_parse_insights_drops_empty_entries() {
        let response = r#"[{"type": "tip", "title": "", "message": "x"}, {"type": "info", "title": "Kept", "message": "y"}]"#;
        let insights = parse_insights(response).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "ai-1");
        assert_eq!(insights[0].title, "Kept");
    }

    #[test]
    fn test_parse_insights_errors() {
        assert!(parse_insights("no json here").is_err());
        assert!(parse_insights("[]").is_err());
        assert!(parse_insights("{\"oops\": true}").is_err());
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("  Spend less on taxis.\n").unwrap(), "Spend less on taxis.");
        assert!(parse_answer("\n").is_err());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), RAW_PREVIEW_LEN + 3);
    }
}
