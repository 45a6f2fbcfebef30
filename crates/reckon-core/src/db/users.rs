//! User operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

impl Database {
    /// Create a user and seed their system "Uncategorized" category
    pub fn create_user(&self, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("User name cannot be empty".into()));
        }
        if self.get_user_by_name(name)?.is_some() {
            return Err(Error::InvalidData(format!(
                "User '{}' already exists",
                name
            )));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("INSERT INTO users (name) VALUES (?)", params![name])?;
        let user_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO categories (user_id, name, is_system) VALUES (?, 'Uncategorized', 1)",
            params![user_id],
        )?;
        tx.commit()?;

        Ok(user_id)
    }

    /// Look up a user by name, creating them (with seeded categories) if new
    pub fn ensure_user(&self, name: &str) -> Result<i64> {
        if let Some(user) = self.get_user_by_name(name)? {
            return Ok(user.id);
        }
        self.create_user(name)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE id = ?",
                params![id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE name = ?",
                params![name.trim()],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at_str: String = row.get(2)?;
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
