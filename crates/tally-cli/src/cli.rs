//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Track daily expenses with AI insights
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Self-hosted expense tracker with AI insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set TALLY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, every API request must carry a JWT, a trusted proxy
        /// header, or an API key.
        #[arg(long)]
        no_auth: bool,

        /// Directory containing static files to serve (e.g., ui/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Record an expense
    Add {
        /// User the expense belongs to
        #[arg(short, long, default_value = tally_server::DEV_USER)]
        user: String,

        /// What the money was spent on
        #[arg(short, long)]
        description: String,

        /// Amount spent (non-negative)
        #[arg(short, long)]
        amount: String,

        /// Category (suggested by the AI backend when omitted)
        #[arg(short, long)]
        category: Option<String>,

        /// Date of the expense, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List recent expenses
    List {
        #[arg(short, long, default_value = tally_server::DEV_USER)]
        user: String,

        /// Maximum number of expenses to show
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },

    /// Show spending statistics
    Stats {
        #[arg(short, long, default_value = tally_server::DEV_USER)]
        user: String,

        /// Days to look back (0 = all time)
        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// Show daily spending as a bar chart
    Chart {
        #[arg(short, long, default_value = tally_server::DEV_USER)]
        user: String,

        /// Days to look back (0 = all time)
        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// Export expenses to CSV
    Export {
        #[arg(short, long, default_value = tally_server::DEV_USER)]
        user: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// AI-powered categorization and insights
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },

    /// Manage AI prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Suggest a category for a description
    Categorize {
        /// Expense description
        description: String,
    },

    /// Generate insights about recent expenses
    Insights {
        #[arg(short, long, default_value = tally_server::DEV_USER)]
        user: String,
    },

    /// Ask a question about recent expenses
    Ask {
        #[arg(short, long, default_value = tally_server::DEV_USER)]
        user: String,

        /// The question to answer
        question: String,
    },

    /// Check the configured AI backend
    Health,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all prompts and their override status
    List,

    /// Show a prompt's content
    Show {
        /// Prompt ID (e.g. categorize_expense)
        id: String,
    },

    /// Print the override directory
    Path,
}
