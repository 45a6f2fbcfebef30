//! Account operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::Account;

impl Database {
    /// Get or create an account by name for a user
    pub fn upsert_account(
        &self,
        user_id: i64,
        name: &str,
        institution: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM accounts WHERE user_id = ? AND name = ?",
                params![user_id, name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO accounts (user_id, name, institution) VALUES (?, ?, ?)",
            params![user_id, name, institution],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                "SELECT id, user_id, name, institution, created_at FROM accounts WHERE id = ?",
                params![id],
                Self::row_to_account,
            )
            .optional()?;
        Ok(account)
    }

    pub fn list_accounts(&self, user_id: i64) -> Result<Vec<Account>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, institution, created_at
             FROM accounts WHERE user_id = ? ORDER BY name",
        )?;
        let accounts = stmt
            .query_map(params![user_id], Self::row_to_account)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    fn row_to_account(row: &rusqlite::Row) -> rusqlite::Result<Account> {
        let created_at_str: String = row.get(4)?;
        Ok(Account {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            institution: row.get(3)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
