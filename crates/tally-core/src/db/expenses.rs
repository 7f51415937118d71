//! Expense record operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{datetime_column, format_datetime, Database};
use crate::error::Result;
use crate::models::{ExpenseExtremes, ExpenseRecord, NewExpense};

const EXPENSE_COLUMNS: &str =
    "id, user_id, description, amount, category, occurred_on, created_at";

fn row_to_expense(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExpenseRecord> {
    Ok(ExpenseRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        occurred_on: datetime_column(row, 5)?,
        created_at: datetime_column(row, 6)?,
    })
}

/// Column a windowed listing filters and sorts on
#[derive(Debug, Clone, Copy)]
enum WindowColumn {
    OccurredOn,
    CreatedAt,
}

impl WindowColumn {
    fn as_str(&self) -> &'static str {
        match self {
            Self::OccurredOn => "occurred_on",
            Self::CreatedAt => "created_at",
        }
    }
}

impl Database {
    /// Insert an expense for a user and return the stored record
    pub fn create_expense(&self, owner_id: i64, expense: &NewExpense) -> Result<ExpenseRecord> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO expenses (user_id, description, amount, category, occurred_on)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                owner_id,
                expense.description,
                expense.amount,
                expense.category,
                format_datetime(&expense.occurred_on),
            ],
        )?;
        let id = conn.last_insert_rowid();

        let record = conn.query_row(
            &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
            params![id],
            row_to_expense,
        )?;

        Ok(record)
    }

    /// Get a single expense owned by a user
    pub fn get_expense(&self, owner_id: i64, id: i64) -> Result<Option<ExpenseRecord>> {
        let conn = self.conn()?;

        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
                    EXPENSE_COLUMNS
                ),
                params![id, owner_id],
                row_to_expense,
            )
            .optional()?;

        Ok(record)
    }

    /// List a user's expenses, newest expense date first
    ///
    /// `since` keeps records whose `occurred_on` is at or after the given
    /// instant; `limit` caps the number returned.
    pub fn list_expenses(
        &self,
        owner_id: i64,
        since: Option<DateTime<Utc>>,
        limit: Option<i64>,
    ) -> Result<Vec<ExpenseRecord>> {
        self.list_windowed(owner_id, WindowColumn::OccurredOn, since, limit)
    }

    /// List a user's most recently recorded expenses, newest insertion first
    ///
    /// Filters on `created_at`; this is the window the insight requests use.
    pub fn list_recent_expenses(
        &self,
        owner_id: i64,
        since: Option<DateTime<Utc>>,
        limit: Option<i64>,
    ) -> Result<Vec<ExpenseRecord>> {
        self.list_windowed(owner_id, WindowColumn::CreatedAt, since, limit)
    }

    fn list_windowed(
        &self,
        owner_id: i64,
        column: WindowColumn,
        since: Option<DateTime<Utc>>,
        limit: Option<i64>,
    ) -> Result<Vec<ExpenseRecord>> {
        let conn = self.conn()?;

        let mut conditions = vec!["user_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id)];

        if let Some(since) = since {
            conditions.push(format!("{} >= ?", column.as_str()));
            params.push(Box::new(format_datetime(&since)));
        }

        let mut sql = format!(
            "SELECT {} FROM expenses WHERE {} ORDER BY {} DESC, id DESC",
            EXPENSE_COLUMNS,
            conditions.join(" AND "),
            column.as_str()
        );

        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
                row_to_expense,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Largest and smallest single expense a user has recorded, zeros when none
    pub fn expense_extremes(&self, owner_id: i64) -> Result<ExpenseExtremes> {
        let conn = self.conn()?;
        let extremes = conn.query_row(
            "SELECT COALESCE(MAX(amount), 0.0), COALESCE(MIN(amount), 0.0) FROM expenses WHERE user_id = ?",
            params![owner_id],
            |row| {
                Ok(ExpenseExtremes {
                    highest: row.get(0)?,
                    lowest: row.get(1)?,
                })
            },
        )?;
        Ok(extremes)
    }

    /// Count a user's expenses
    pub fn count_expenses(&self, owner_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE user_id = ?",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an expense owned by a user. Returns false if nothing matched.
    pub fn delete_expense(&self, owner_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            params![id, owner_id],
        )?;
        Ok(deleted > 0)
    }
}
