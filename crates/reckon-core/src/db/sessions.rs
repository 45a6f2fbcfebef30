//! Import session operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{ImportSession, ImportSummary};

impl Database {
    /// Record the start of an import; counters are filled in at finalize
    pub fn create_import_session(
        &self,
        user_id: i64,
        account_id: Option<i64>,
        filename: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO import_sessions (user_id, account_id, filename) VALUES (?, ?, ?)",
            params![user_id, account_id, filename],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Write the final counters for a completed import
    pub fn finalize_import_session(&self, id: i64, summary: &ImportSummary) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE import_sessions SET imported = ?, duplicates = ?, errors = ?, total = ?
             WHERE id = ?",
            params![
                summary.imported,
                summary.duplicates,
                summary.errors,
                summary.total,
                id
            ],
        )?;
        Ok(())
    }

    pub fn get_import_session(&self, id: i64) -> Result<Option<ImportSession>> {
        let conn = self.conn()?;
        let session = conn
            .query_row(
                "SELECT id, user_id, account_id, filename, imported, duplicates, errors, total, created_at
                 FROM import_sessions WHERE id = ?",
                params![id],
                Self::row_to_session,
            )
            .optional()?;
        Ok(session)
    }

    /// Most recent imports first
    pub fn list_import_sessions(&self, user_id: i64, limit: i64) -> Result<Vec<ImportSession>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, account_id, filename, imported, duplicates, errors, total, created_at
             FROM import_sessions WHERE user_id = ?
             ORDER BY id DESC LIMIT ?",
        )?;
        let sessions = stmt
            .query_map(params![user_id, limit], Self::row_to_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<ImportSession> {
        let created_at_str: String = row.get(8)?;
        Ok(ImportSession {
            id: row.get(0)?,
            user_id: row.get(1)?,
            account_id: row.get(2)?,
            filename: row.get(3)?,
            imported: row.get(4)?,
            duplicates: row.get(5)?,
            errors: row.get(6)?,
            total: row.get(7)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
