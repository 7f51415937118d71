//! AI command implementations

use anyhow::Result;
use tally_core::ai::{AIBackend, AIClient, InsightKind};
use tally_core::db::Database;
use tally_core::insights;

use super::resolve_user;

fn insight_icon(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Warning => "⚠️ ",
        InsightKind::Info => "ℹ️ ",
        InsightKind::Success => "✅",
        InsightKind::Tip => "💡",
    }
}

pub async fn cmd_ai_categorize(ai: Option<&AIClient>, description: &str) -> Result<()> {
    let suggestion = insights::suggest_category(ai, description).await;

    println!("\"{}\" → {}", description, suggestion.category);
    if let Some(reason) = suggestion.error {
        println!("   ({})", reason);
    }

    Ok(())
}

pub async fn cmd_ai_insights(db: &Database, ai: Option<&AIClient>, user: &str) -> Result<()> {
    let owner = resolve_user(db, user)?;
    let insights = insights::expense_insights(db, ai, owner.id).await;

    println!("🤖 Spending Insights\n");
    for insight in &insights {
        println!("{} {}", insight_icon(insight.kind), insight.title);
        println!("   {}", insight.message);
        if let Some(ref action) = insight.action {
            println!("   → {}", action);
        }
        println!();
    }

    Ok(())
}

pub async fn cmd_ai_ask(
    db: &Database,
    ai: Option<&AIClient>,
    user: &str,
    question: &str,
) -> Result<()> {
    let owner = resolve_user(db, user)?;
    let answer = insights::answer_insight_question(db, ai, owner.id, question).await;

    println!("{}", answer);

    Ok(())
}

/// Show the configured backend and whether it responds
pub async fn cmd_ai_health(ai: Option<&AIClient>) -> Result<()> {
    let Some(client) = ai else {
        println!("⚠️  No AI backend configured");
        println!();
        println!("To configure one:");
        println!("  export OPENAI_COMPATIBLE_HOST=https://api.openai.com");
        println!("  export OPENAI_COMPATIBLE_API_KEY=...");
        println!("or, for a local model:");
        println!("  export AI_BACKEND=ollama OLLAMA_HOST=http://localhost:11434");
        return Ok(());
    };

    println!("🔍 Checking AI backend...");
    println!("   Host:  {}", client.host());
    println!("   Model: {}", client.model());

    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Not responding at {}", client.host());
    }

    Ok(())
}
