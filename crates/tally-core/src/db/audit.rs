//! Per-user activity trail

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use super::{datetime_column, Database};
use crate::error::Result;

/// One recorded action, as shown back to the user who made it
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub at: DateTime<Utc>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            at: datetime_column(row, 1)?,
            action: row.get(2)?,
            entity_type: row.get(3)?,
            entity_id: row.get(4)?,
            details: row.get(5)?,
        })
    }
}

impl Database {
    /// Append an action to `user_id`'s trail
    pub fn log_audit(
        &self,
        user_id: &str,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<i64>,
        details: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO audit_log (user_id, action, entity_type, entity_id, details) VALUES (?, ?, ?, ?, ?)",
            params![user_id, action, entity_type, entity_id, details],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent actions of one user, newest first
    pub fn list_audit_log(&self, user_id: &str, limit: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, action, entity_type, entity_id, details FROM audit_log \
             WHERE user_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
        )?;
        let entries = stmt
            .query_map(params![user_id, limit], AuditEntry::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
