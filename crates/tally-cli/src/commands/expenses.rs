//! Expense command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tally_core::aggregate::{bucket_by_day, chart_points, compute_summary, SpendingTier};
use tally_core::ai::AIClient;
use tally_core::db::Database;
use tally_core::export::ExpenseExportOptions;
use tally_core::insights;
use tally_core::models::ExpenseRecord;
use tally_core::validation::ExpenseForm;

use super::{resolve_user, truncate};

const CHART_WIDTH: usize = 40;

/// Record an expense, asking the AI backend for a category when none is given
pub async fn cmd_add(
    db: &Database,
    ai: Option<&AIClient>,
    user: &str,
    description: &str,
    amount: &str,
    category: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let category = match category {
        Some(c) => c.to_string(),
        None => {
            let suggestion = insights::suggest_category(ai, description).await;
            match suggestion.error {
                Some(ref reason) => println!("   💡 {} - using {}", reason, suggestion.category),
                None => println!("   🤖 Suggested category: {}", suggestion.category),
            }
            suggestion.category
        }
    };

    let form = ExpenseForm {
        description: Some(description.to_string()),
        amount: Some(amount.to_string()),
        category: Some(category),
        date: Some(
            date.map(str::to_string)
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
        ),
    };
    let expense = form.validate()?;

    let owner = resolve_user(db, user)?;
    let record = db
        .create_expense(owner.id, &expense)
        .context("Failed to save expense")?;

    println!(
        "✅ Recorded #{}: {} ${:.2} ({}) on {}",
        record.id,
        record.description,
        record.amount,
        record.category,
        record.calendar_date()
    );

    Ok(())
}

/// List a user's most recent expenses
pub fn cmd_list(db: &Database, user: &str, limit: i64) -> Result<()> {
    let owner = resolve_user(db, user)?;
    let records = db.list_expenses(owner.id, None, Some(limit.max(1)))?;

    if records.is_empty() {
        println!("No expenses recorded yet. Add one with: tally add -d Lunch -a 12.50");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<30} {:>10}  {}",
        "ID", "DATE", "DESCRIPTION", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(80));

    for record in &records {
        print_expense(record);
    }

    Ok(())
}

fn print_expense(record: &ExpenseRecord) {
    println!(
        "{:<6} {:<12} {:<30} {:>10.2}  {}",
        record.id,
        record.calendar_date().format("%Y-%m-%d").to_string(),
        truncate(&record.description, 30),
        record.amount,
        record.category
    );
}

/// Start of the look-back window; 0 days means all time
pub fn window_start(days: i64) -> Result<Option<DateTime<Utc>>> {
    match days {
        0 => Ok(None),
        d if d < 0 => bail!("--days must not be negative"),
        d => Duration::try_days(d)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .map(Some)
            .context("--days is out of range"),
    }
}

fn describe_window(days: i64) -> String {
    if days == 0 {
        "all time".to_string()
    } else {
        format!("last {} days", days)
    }
}

/// Print summary statistics for a window
pub fn cmd_stats(db: &Database, user: &str, days: i64) -> Result<()> {
    let since = window_start(days)?;
    let owner = resolve_user(db, user)?;
    let records = db.list_expenses(owner.id, since, None)?;
    let summary = compute_summary(&records);
    let all_time = db.expense_extremes(owner.id)?;

    println!("📊 Spending Statistics ({})", describe_window(days));
    println!("   ─────────────────────────────");
    println!("   Expenses:            {}", records.len());
    println!("   Active days:         {}", summary.active_days);
    println!("   Total:               ${:.2}", summary.total);
    println!("   Average/active day:  ${:.2}", summary.average_per_active_day);
    println!("   Highest day:         ${:.2}", summary.max_amount);
    println!("   Lowest day:          ${:.2}", summary.min_amount);
    println!("   Biggest ever:        ${:.2}", all_time.highest);
    println!("   Smallest ever:       ${:.2}", all_time.lowest);

    Ok(())
}

fn tier_label(tier: SpendingTier) -> &'static str {
    match tier {
        SpendingTier::High => "high",
        SpendingTier::Medium => "medium",
        SpendingTier::Moderate => "moderate",
        SpendingTier::Low => "low",
    }
}

/// Print daily totals as horizontal bars, oldest day first
pub fn cmd_chart(db: &Database, user: &str, days: i64) -> Result<()> {
    let since = window_start(days)?;
    let owner = resolve_user(db, user)?;
    let records = db.list_expenses(owner.id, since, None)?;
    let points = chart_points(&bucket_by_day(&records));

    if points.is_empty() {
        println!("No expenses in the {}.", describe_window(days));
        return Ok(());
    }

    let max = points.iter().map(|p| p.amount).fold(0.0_f64, f64::max);

    println!("📈 Daily Spending ({})", describe_window(days));
    println!();
    for point in &points {
        let width = if max > 0.0 {
            ((point.amount / max) * CHART_WIDTH as f64).round() as usize
        } else {
            0
        };
        println!(
            "{}  {:<width$} ${:>9.2}  {:<8} {}",
            point.label,
            "█".repeat(width),
            point.amount,
            tier_label(point.tier),
            point.categories.join(", "),
            width = CHART_WIDTH
        );
    }

    Ok(())
}

fn parse_date_arg(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("Invalid --{} date '{}' (use YYYY-MM-DD)", name, s))
        })
        .transpose()
}

/// Export a user's expenses as CSV to a file or stdout
pub fn cmd_export(
    db: &Database,
    user: &str,
    output: Option<&Path>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let opts = ExpenseExportOptions {
        from: parse_date_arg("from", from)?,
        to: parse_date_arg("to", to)?,
    };

    let owner = resolve_user(db, user)?;
    let csv = db
        .export_expenses_csv(owner.id, &opts)
        .context("Failed to export expenses")?;

    match output {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let rows = csv.lines().count().saturating_sub(1);
            println!("✅ Exported {} expenses to {}", rows, path.display());
        }
        None => print!("{}", csv),
    }

    Ok(())
}
