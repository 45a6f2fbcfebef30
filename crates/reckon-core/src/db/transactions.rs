//! Transaction operations

use rusqlite::{params, ErrorCode, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{ClassificationSource, NewTransaction, Transaction};

/// Result of attempting a transaction insert
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// Inserted successfully; contains the new transaction id
    Inserted(i64),
    /// The fingerprint already exists for this user; nothing was written
    Duplicate,
}

const SELECT_COLUMNS: &str = "id, user_id, account_id, posted_date, description, amount, txn_type,
        merchant_key, fingerprint_hash, category_id, classification_source,
        classification_confidence, original_data, import_session_id, created_at";

impl Database {
    /// Attempt to insert a transaction
    ///
    /// Relies on the unique index over (user_id, fingerprint_hash) rather than
    /// a lookup-then-insert: a uniqueness violation on the fingerprint is the
    /// expected steady-state signal for a re-imported row and maps to
    /// [`InsertOutcome::Duplicate`]. Any other failure propagates.
    pub fn insert_transaction(
        &self,
        user_id: i64,
        account_id: Option<i64>,
        import_session_id: Option<i64>,
        tx: &NewTransaction,
    ) -> Result<InsertOutcome> {
        let conn = self.conn()?;

        let result = conn.execute(
            r#"
            INSERT INTO transactions
                (user_id, account_id, posted_date, description, amount, txn_type,
                 merchant_key, fingerprint_hash, category_id, classification_source,
                 classification_confidence, original_data, import_session_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                account_id,
                tx.posted_date.to_string(),
                tx.description,
                tx.amount,
                tx.txn_type.as_str(),
                tx.merchant_key,
                tx.fingerprint_hash,
                tx.category_id,
                tx.classification_source.as_str(),
                tx.classification_confidence,
                tx.original_data,
                import_session_id,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(err, Some(ref msg)))
                if err.code == ErrorCode::ConstraintViolation
                    && msg.contains("fingerprint_hash") =>
            {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM transactions WHERE id = ?", SELECT_COLUMNS);
        let transaction = conn
            .query_row(&sql, params![id], Self::row_to_transaction)
            .optional()?;
        Ok(transaction)
    }

    /// List a user's transactions, most recent first
    pub fn list_transactions(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id = ?
             ORDER BY posted_date DESC, id DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params![user_id, limit, offset], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Transactions from one import session still at the default classification
    ///
    /// These are the candidates for the post-import rule sweep.
    pub fn default_classified_for_session(
        &self,
        user_id: i64,
        import_session_id: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions
             WHERE user_id = ? AND import_session_id = ? AND classification_source = 'default'
             ORDER BY id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(
                params![user_id, import_session_id],
                Self::row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// All of a user's transactions except manual ones
    ///
    /// Candidate set for reapplying a rule to existing data; the manual
    /// exclusion lives here so every reapply path shares it.
    pub fn non_manual_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM transactions
             WHERE user_id = ? AND classification_source != 'manual'
             ORDER BY id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(params![user_id], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Update a transaction's classification; the fingerprint never changes
    pub fn update_classification(
        &self,
        id: i64,
        category_id: Option<i64>,
        source: ClassificationSource,
        confidence: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions
             SET category_id = ?, classification_source = ?, classification_confidence = ?
             WHERE id = ?",
            params![category_id, source.as_str(), confidence, id],
        )?;
        Ok(())
    }

    /// User override: set a category by hand
    ///
    /// Records `manual` at full confidence, which shields the transaction from
    /// all future automatic passes.
    pub fn set_manual_category(
        &self,
        user_id: i64,
        transaction_id: i64,
        category_id: i64,
    ) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions
             SET category_id = ?, classification_source = 'manual', classification_confidence = 1.0
             WHERE user_id = ? AND id = ?",
            params![category_id, user_id, transaction_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("Transaction {}", transaction_id)));
        }
        Ok(())
    }

    /// Slim (id, description, merchant_key) rows for key regeneration
    pub fn list_merchant_keys(&self, user_id: i64) -> Result<Vec<(i64, String, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, description, merchant_key FROM transactions WHERE user_id = ? ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update_merchant_key(&self, id: i64, merchant_key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET merchant_key = ? WHERE id = ?",
            params![merchant_key, id],
        )?;
        Ok(())
    }

    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn count_by_source(&self, user_id: i64, source: ClassificationSource) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ? AND classification_source = ?",
            params![user_id, source.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Helper to convert a row to Transaction
    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let date_str: String = row.get(3)?;
        let txn_type_str: String = row.get(6)?;
        let source_str: String = row.get(10)?;
        let created_at_str: String = row.get(14)?;
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            account_id: row.get(2)?,
            posted_date: chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .unwrap_or_default(),
            description: row.get(4)?,
            amount: row.get(5)?,
            txn_type: txn_type_str.parse().unwrap_or(crate::models::TransactionType::Debit),
            merchant_key: row.get(7)?,
            fingerprint_hash: row.get(8)?,
            category_id: row.get(9)?,
            classification_source: source_str.parse().unwrap_or_default(),
            classification_confidence: row.get(11)?,
            original_data: row.get(12)?,
            import_session_id: row.get(13)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
