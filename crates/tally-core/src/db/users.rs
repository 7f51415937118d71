//! User operations

use rusqlite::{params, OptionalExtension};

use super::{datetime_column, Database};
use crate::error::Result;
use crate::models::{User, UserProfile};

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        image_url: row.get(4)?,
        created_at: datetime_column(row, 5)?,
    })
}

impl Database {
    /// Look up a user by the provider's subject identifier
    pub fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                r#"
                SELECT id, external_id, name, email, image_url, created_at
                FROM users WHERE external_id = ?
                "#,
                params![external_id],
                row_to_user,
            )
            .optional()?;

        Ok(user)
    }

    /// Return the local user for a provider subject, creating it on first sight
    ///
    /// Profile fields are only written on insert; later calls never overwrite them.
    pub fn get_or_create_user(&self, external_id: &str, profile: &UserProfile) -> Result<User> {
        if let Some(user) = self.get_user_by_external_id(external_id)? {
            return Ok(user);
        }

        let conn = self.conn()?;
        // Two first requests may race; the UNIQUE constraint keeps a single row
        conn.execute(
            r#"
            INSERT INTO users (external_id, name, email, image_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(external_id) DO NOTHING
            "#,
            params![
                external_id,
                profile.name,
                profile.email,
                profile.image_url
            ],
        )?;

        let user = conn.query_row(
            r#"
            SELECT id, external_id, name, email, image_url, created_at
            FROM users WHERE external_id = ?
            "#,
            params![external_id],
            row_to_user,
        )?;

        tracing::info!(user_id = user.id, external_id, "Registered new user");
        Ok(user)
    }
}
