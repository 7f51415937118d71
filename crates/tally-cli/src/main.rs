//! Tally CLI - Daily expense tracker with AI insights
//!
//! Usage:
//!   tally init                          Initialize database
//!   tally add -d Lunch -a 12.50         Record an expense
//!   tally stats --days 30               Spending statistics
//!   tally ai insights                   AI commentary on recent spending
//!   tally serve --port 3000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
        Commands::Add {
            user,
            description,
            amount,
            category,
            date,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let ai = tally_core::ai::AIClient::from_env();
            commands::cmd_add(
                &db,
                ai.as_ref(),
                &user,
                &description,
                &amount,
                category.as_deref(),
                date.as_deref(),
            )
            .await
        }
        Commands::List { user, limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_list(&db, &user, limit)
        }
        Commands::Stats { user, days } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_stats(&db, &user, days)
        }
        Commands::Chart { user, days } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_chart(&db, &user, days)
        }
        Commands::Export {
            user,
            output,
            from,
            to,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_export(&db, &user, output.as_deref(), from.as_deref(), to.as_deref())
        }
        Commands::Ai { action } => {
            let ai = tally_core::ai::AIClient::from_env();
            match action {
                AiAction::Categorize { description } => {
                    commands::cmd_ai_categorize(ai.as_ref(), &description).await
                }
                AiAction::Insights { user } => {
                    let db = commands::open_db(&cli.db, cli.no_encrypt)?;
                    commands::cmd_ai_insights(&db, ai.as_ref(), &user).await
                }
                AiAction::Ask { user, question } => {
                    let db = commands::open_db(&cli.db, cli.no_encrypt)?;
                    commands::cmd_ai_ask(&db, ai.as_ref(), &user, &question).await
                }
                AiAction::Health => commands::cmd_ai_health(ai.as_ref()).await,
            }
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
