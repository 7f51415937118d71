//! CSV export of a user's expenses

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::ExpenseRecord;

/// Options for expense export
#[derive(Debug, Clone, Default)]
pub struct ExpenseExportOptions {
    /// Start date filter (inclusive)
    pub from: Option<NaiveDate>,
    /// End date filter (inclusive)
    pub to: Option<NaiveDate>,
}

impl ExpenseExportOptions {
    fn includes(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// One CSV row
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseExport {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub category: String,
    pub recorded_at: String,
}

impl From<&ExpenseRecord> for ExpenseExport {
    fn from(record: &ExpenseRecord) -> Self {
        Self {
            date: record.calendar_date().format("%Y-%m-%d").to_string(),
            description: record.description.clone(),
            amount: format!("{:.2}", record.amount),
            category: record.category.clone(),
            recorded_at: record.created_at.to_rfc3339(),
        }
    }
}

impl Database {
    /// Rows for a user's expenses, oldest expense date first
    pub fn export_expenses(
        &self,
        owner_id: i64,
        opts: &ExpenseExportOptions,
    ) -> Result<Vec<ExpenseExport>> {
        let mut records = self.list_expenses(owner_id, None, None)?;
        records.reverse();

        Ok(records
            .iter()
            .filter(|r| opts.includes(r.calendar_date()))
            .map(ExpenseExport::from)
            .collect())
    }

    /// Export a user's expenses as CSV text with a header row
    pub fn export_expenses_csv(&self, owner_id: i64, opts: &ExpenseExportOptions) -> Result<String> {
        let rows = self.export_expenses(owner_id, opts)?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["date", "description", "amount", "category", "recorded_at"])?;
        for row in &rows {
            writer.write_record([
                &row.date,
                &row.description,
                &row.amount,
                &row.category,
                &row.recorded_at,
            ])?;
        }

        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| Error::InvalidData(format!("CSV is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewExpense, UserProfile};
    use crate::validation::parse_expense_date;

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user = db
            .get_or_create_user("user_export", &UserProfile::default())
            .unwrap();

        for (description, amount, date) in [
            ("Coffee, large", 4.5, "2024-06-15"),
            ("Rent", 1200.0, "2024-06-01"),
            ("Book \"Dune\"", 18.0, "2024-07-02"),
        ] {
            db.create_expense(
                user.id,
                &NewExpense {
                    description: description.to_string(),
                    amount,
                    category: "Other".to_string(),
                    occurred_on: parse_expense_date(date).unwrap(),
                },
            )
            .unwrap();
        }

        (db, user.id)
    }

    #[test]
    fn test_export_empty() {
        let db = Database::in_memory().unwrap();
        let csv = db.export_expenses_csv(1, &ExpenseExportOptions::default()).unwrap();
        assert_eq!(csv, "date,description,amount,category,recorded_at\n");
    }

    #[test]
    fn test_export_orders_oldest_first() {
        let (db, owner_id) = setup();
        let rows = db
            .export_expenses(owner_id, &ExpenseExportOptions::default())
            .unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-01", "2024-06-15", "2024-07-02"]);
        assert_eq!(rows[0].amount, "1200.00");
    }

    #[test]
    fn test_export_date_filter() {
        let (db, owner_id) = setup();
        let opts = ExpenseExportOptions {
            from: NaiveDate::from_ymd_opt(2024, 6, 10),
            to: NaiveDate::from_ymd_opt(2024, 6, 30),
        };
        let rows = db.export_expenses(owner_id, &opts).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "Coffee, large");
    }

    #[test]
    fn test_export_csv_quotes_fields() {
        let (db, owner_id) = setup();
        let csv = db
            .export_expenses_csv(owner_id, &ExpenseExportOptions::default())
            .unwrap();
        assert!(csv.contains("2024-06-15,\"Coffee, large\",4.50,Other,"));
        assert!(csv.contains("\"Book \"\"Dune\"\"\""));
        assert_eq!(csv.lines().count(), 4);
    }
}
