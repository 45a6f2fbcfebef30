//! Category operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::Category;

impl Database {
    pub fn create_category(&self, user_id: i64, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".into()));
        }
        if self.get_category_by_name(user_id, name)?.is_some() {
            return Err(Error::InvalidData(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name) VALUES (?, ?)",
            params![user_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, user_id, name, is_system, created_at FROM categories WHERE id = ?",
                params![id],
                Self::row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Case-insensitive lookup by name
    pub fn get_category_by_name(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, user_id, name, is_system, created_at
                 FROM categories WHERE user_id = ? AND name = ? COLLATE NOCASE",
                params![user_id, name.trim()],
                Self::row_to_category,
            )
            .optional()?;
        Ok(category)
    }

    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, is_system, created_at
             FROM categories WHERE user_id = ? ORDER BY is_system DESC, name",
        )?;
        let categories = stmt
            .query_map(params![user_id], Self::row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// The user's system fallback category
    ///
    /// Seeded at user creation; its absence means the user context is broken,
    /// which aborts an import before any row is processed.
    pub fn uncategorized_category(&self, user_id: i64) -> Result<Category> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, user_id, name, is_system, created_at
             FROM categories WHERE user_id = ? AND is_system = 1",
            params![user_id],
            Self::row_to_category,
        )
        .optional()?
        .ok_or_else(|| {
            Error::NotFound(format!("Uncategorized category for user {}", user_id))
        })
    }

    fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        let is_system_int: i64 = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        Ok(Category {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            is_system: is_system_int != 0,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
