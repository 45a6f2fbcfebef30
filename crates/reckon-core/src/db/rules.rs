//! Categorization rule operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CategoryRule, NewCategoryRule};

/// Patterns are stored lowercased and trimmed so uniqueness and substring
/// matching are both case-insensitive
fn normalize_pattern(pattern: &str) -> Result<String> {
    let normalized = pattern.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::Rule("Rule pattern cannot be empty".into()));
    }
    Ok(normalized)
}

fn validate_bounds(amount_min: Option<f64>, amount_max: Option<f64>) -> Result<()> {
    if let (Some(min), Some(max)) = (amount_min, amount_max) {
        if min > max {
            return Err(Error::Rule(format!(
                "amount_min ({}) exceeds amount_max ({})",
                min, max
            )));
        }
    }
    Ok(())
}

impl Database {
    /// Create a rule; rejects a pattern that already exists for the user
    pub fn create_rule(&self, user_id: i64, rule: &NewCategoryRule) -> Result<i64> {
        let pattern = normalize_pattern(&rule.merchant_pattern)?;
        validate_bounds(rule.amount_min, rule.amount_max)?;

        if self.get_rule_by_pattern(user_id, &pattern)?.is_some() {
            return Err(Error::Rule(format!(
                "A rule with pattern '{}' already exists",
                pattern
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO category_rules
                (user_id, merchant_pattern, category_id, amount_min, amount_max, priority, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                pattern,
                rule.category_id,
                rule.amount_min,
                rule.amount_max,
                rule.priority,
                rule.is_active,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_rule(&self, user_id: i64, id: i64) -> Result<Option<CategoryRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                "SELECT id, user_id, merchant_pattern, category_id, amount_min, amount_max,
                        priority, is_active, match_count, created_at
                 FROM category_rules WHERE user_id = ? AND id = ?",
                params![user_id, id],
                Self::row_to_rule,
            )
            .optional()?;
        Ok(rule)
    }

    pub fn get_rule_by_pattern(
        &self,
        user_id: i64,
        pattern: &str,
    ) -> Result<Option<CategoryRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                "SELECT id, user_id, merchant_pattern, category_id, amount_min, amount_max,
                        priority, is_active, match_count, created_at
                 FROM category_rules WHERE user_id = ? AND merchant_pattern = ?",
                params![user_id, pattern.trim().to_lowercase()],
                Self::row_to_rule,
            )
            .optional()?;
        Ok(rule)
    }

    /// List a user's rules in evaluation order
    ///
    /// Priority descending; ties resolve by creation order, then id, so
    /// evaluation is deterministic.
    pub fn list_rules(&self, user_id: i64) -> Result<Vec<CategoryRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, merchant_pattern, category_id, amount_min, amount_max,
                    priority, is_active, match_count, created_at
             FROM category_rules WHERE user_id = ?
             ORDER BY priority DESC, created_at, id",
        )?;
        let rules = stmt
            .query_map(params![user_id], Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Update rule fields; `None` leaves a field untouched, `Some(None)`
    /// clears a nullable bound
    #[allow(clippy::too_many_arguments)]
    pub fn update_rule(
        &self,
        user_id: i64,
        id: i64,
        pattern: Option<&str>,
        category_id: Option<i64>,
        amount_min: Option<Option<f64>>,
        amount_max: Option<Option<f64>>,
        priority: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<()> {
        let existing = self
            .get_rule(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("Rule {}", id)))?;

        let new_pattern = match pattern {
            Some(p) => {
                let normalized = normalize_pattern(p)?;
                if normalized != existing.merchant_pattern {
                    if self.get_rule_by_pattern(user_id, &normalized)?.is_some() {
                        return Err(Error::Rule(format!(
                            "A rule with pattern '{}' already exists",
                            normalized
                        )));
                    }
                }
                normalized
            }
            None => existing.merchant_pattern,
        };
        let new_min = amount_min.unwrap_or(existing.amount_min);
        let new_max = amount_max.unwrap_or(existing.amount_max);
        validate_bounds(new_min, new_max)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE category_rules
            SET merchant_pattern = ?, category_id = ?, amount_min = ?, amount_max = ?,
                priority = ?, is_active = ?
            WHERE user_id = ? AND id = ?
            "#,
            params![
                new_pattern,
                category_id.unwrap_or(existing.category_id),
                new_min,
                new_max,
                priority.unwrap_or(existing.priority),
                is_active.unwrap_or(existing.is_active),
                user_id,
                id,
            ],
        )?;

        Ok(())
    }

    /// Delete a rule
    ///
    /// Transactions the rule already categorized keep their category.
    pub fn delete_rule(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM category_rules WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Rule {}", id)));
        }
        Ok(())
    }

    /// Bump a rule's match counter after it assigned categories
    pub fn increment_rule_matches(&self, id: i64, by: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE category_rules SET match_count = match_count + ? WHERE id = ?",
            params![by, id],
        )?;
        Ok(())
    }

    fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<CategoryRule> {
        let is_active_int: i64 = row.get(7)?;
        let created_at_str: String = row.get(9)?;
        Ok(CategoryRule {
            id: row.get(0)?,
            user_id: row.get(1)?,
            merchant_pattern: row.get(2)?,
            category_id: row.get(3)?,
            amount_min: row.get(4)?,
            amount_max: row.get(5)?,
            priority: row.get(6)?,
            is_active: is_active_int != 0,
            match_count: row.get(8)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
