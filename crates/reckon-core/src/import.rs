//! Import orchestrator
//!
//! Drives one upload through the pipeline, row by row in file order:
//! validate -> normalize -> merchant key -> fingerprint -> insert. Row-level
//! problems (missing fields, unparseable values, non-duplicate store errors)
//! are counted and skipped, never aborting the batch; only context-loading
//! failures (unknown user, broken category seed, foreign account) abort
//! before any row is processed. After the batch, the rule sweep runs once
//! over the session's newly inserted default-classified rows — best-effort,
//! so a sweep failure leaves transactions uncategorized rather than losing
//! the import.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::db::{Database, InsertOutcome};
use crate::error::{Error, Result};
use crate::fingerprint::fingerprint;
use crate::merchant::merchant_key;
use crate::models::{
    Category, ClassificationSource, ImportSummary, NewTransaction, TransactionType,
};
use crate::normalize::{parse_amount, DateParser};
use crate::parse::{ColumnMapping, CsvRow, ParsedCsv};
use crate::rules::{self, RuleEngine, DEFAULT_CONFIDENCE, EXPLICIT_CONFIDENCE};

/// Snapshot a row as a JSON object, in header order, for reprocessing
fn row_to_json(headers: &[String], row: &CsvRow) -> String {
    let mut map = serde_json::Map::new();
    for header in headers {
        if let Some(value) = row.get(header.as_str()) {
            map.insert(header.clone(), Value::String(value.clone()));
        }
    }
    json!(map).to_string()
}

/// Import orchestrator bound to a database handle
pub struct Importer<'a> {
    db: &'a Database,
}

impl<'a> Importer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Run one import
    ///
    /// `mapping` is the caller-confirmed column selection — detection output
    /// is never used here directly. Returns the aggregate counters; per-row
    /// outcomes are logged, not returned.
    pub fn run(
        &self,
        user_id: i64,
        account_id: Option<i64>,
        filename: Option<&str>,
        parsed: &ParsedCsv,
        mapping: &ColumnMapping,
    ) -> Result<ImportSummary> {
        // Context loading; any failure here aborts the whole import
        self.db
            .get_user(user_id)?
            .ok_or_else(|| Error::NotFound(format!("User {}", user_id)))?;
        let fallback = self.db.uncategorized_category(user_id)?;
        let categories = self.db.list_categories(user_id)?;
        if let Some(id) = account_id {
            let account = self
                .db
                .get_account(id)?
                .ok_or_else(|| Error::NotFound(format!("Account {}", id)))?;
            if account.user_id != user_id {
                return Err(Error::InvalidData(format!(
                    "Account {} does not belong to user {}",
                    id, user_id
                )));
            }
        }

        let session_id = self.db.create_import_session(user_id, account_id, filename)?;

        let mut summary = ImportSummary {
            total: parsed.rows.len() as i64,
            ..Default::default()
        };
        let mut date_parser = DateParser::new();

        for (index, row) in parsed.rows.iter().enumerate() {
            let tx = match self.prepare_row(
                row,
                mapping,
                &mut date_parser,
                account_id,
                &categories,
                &fallback,
                &parsed.headers,
            ) {
                Ok(tx) => tx,
                Err(e) => {
                    debug!("Row {}: {}", index + 1, e);
                    summary.errors += 1;
                    continue;
                }
            };

            match self
                .db
                .insert_transaction(user_id, account_id, Some(session_id), &tx)
            {
                Ok(InsertOutcome::Inserted(_)) => summary.imported += 1,
                Ok(InsertOutcome::Duplicate) => summary.duplicates += 1,
                Err(e) => {
                    warn!("Row {}: insert failed: {}", index + 1, e);
                    summary.errors += 1;
                }
            }
        }

        self.db.finalize_import_session(session_id, &summary)?;
        info!(
            "Import complete: {} imported, {} duplicates, {} errors of {} rows",
            summary.imported, summary.duplicates, summary.errors, summary.total
        );

        // Categorization is secondary to the import itself: a sweep failure
        // leaves rows at the default classification, it does not undo the run
        if summary.imported > 0 {
            match RuleEngine::new(self.db).sweep_session(user_id, session_id) {
                Ok(sweep) => info!(
                    "Rule sweep categorized {} of {} new transactions",
                    sweep.categorized, sweep.scanned
                ),
                Err(e) => warn!("Rule sweep failed, transactions left uncategorized: {}", e),
            }
        }

        Ok(summary)
    }

    /// Validate and normalize one row into an insertable transaction
    #[allow(clippy::too_many_arguments)]
    fn prepare_row(
        &self,
        row: &CsvRow,
        mapping: &ColumnMapping,
        date_parser: &mut DateParser,
        account_id: Option<i64>,
        categories: &[Category],
        fallback: &Category,
        headers: &[String],
    ) -> Result<NewTransaction> {
        let date_raw = required_field(row, &mapping.posted_date)?;
        let description = required_field(row, &mapping.description)?;
        let amount_raw = required_field(row, &mapping.amount)?;

        let amount = parse_amount(amount_raw)?;
        let posted_date = date_parser.parse(date_raw)?;

        let key = merchant_key(description);
        let fingerprint_hash = fingerprint(posted_date, amount, description, account_id);

        // An explicit category column outranks everything downstream; a value
        // naming a real category is treated like a user decision
        let explicit = mapping
            .category
            .as_ref()
            .and_then(|column| row.get(column.as_str()))
            .and_then(|raw| rules::match_category_name(categories, raw));

        let (category_id, source, confidence) = match explicit {
            Some(id) => (Some(id), ClassificationSource::Manual, EXPLICIT_CONFIDENCE),
            None => (
                Some(fallback.id),
                ClassificationSource::Default,
                DEFAULT_CONFIDENCE,
            ),
        };

        Ok(NewTransaction {
            posted_date,
            description: description.to_string(),
            amount,
            txn_type: TransactionType::from_amount(amount),
            merchant_key: key,
            fingerprint_hash,
            category_id,
            classification_source: source,
            classification_confidence: confidence,
            original_data: Some(row_to_json(headers, row)),
        })
    }
}

/// Fetch a required mapped cell, rejecting missing or blank values
fn required_field<'r>(row: &'r CsvRow, column: &str) -> Result<&'r str> {
    let value = row
        .get(column)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Import(format!("Missing required field '{}'", column)))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCategoryRule;
    use crate::parse::parse_csv;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            posted_date: "Date".to_string(),
            description: "Description".to_string(),
            amount: "Amount".to_string(),
            category: None,
        }
    }

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        (db, user_id)
    }

    #[test]
    fn test_import_counts_and_defaults() {
        let (db, user_id) = setup();
        let csv = "Date,Description,Amount\n\
                   01/15/2024,NETFLIX.COM,-15.99\n\
                   01/14/2024,STARBUCKS #1234,-5.50";
        let parsed = parse_csv(csv).unwrap();

        let summary = Importer::new(&db)
            .run(user_id, None, Some("test.csv"), &parsed, &mapping())
            .unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.duplicates, 0);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.total, 2);

        let transactions = db.list_transactions(user_id, 10, 0).unwrap();
        assert_eq!(transactions.len(), 2);
        let netflix = transactions
            .iter()
            .find(|t| t.description == "NETFLIX.COM")
            .unwrap();
        assert_eq!(netflix.merchant_key, "NETFLIX");
        assert_eq!(netflix.txn_type, TransactionType::Debit);
        assert_eq!(netflix.classification_source, ClassificationSource::Default);
        assert_eq!(netflix.classification_confidence, DEFAULT_CONFIDENCE);
        assert!(netflix.category_id.is_some());
        assert!(netflix.original_data.as_deref().unwrap().contains("NETFLIX.COM"));
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let (db, user_id) = setup();
        let csv = "Date,Description,Amount\n\
                   01/15/2024,NETFLIX.COM,-15.99\n\
                   01/14/2024,STARBUCKS #1234,-5.50";
        let parsed = parse_csv(csv).unwrap();
        let importer = Importer::new(&db);

        let first = importer.run(user_id, None, None, &parsed, &mapping()).unwrap();
        assert_eq!(first.imported, 2);
        assert_eq!(first.duplicates, 0);

        let second = importer.run(user_id, None, None, &parsed, &mapping()).unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.duplicates, 2);

        assert_eq!(db.count_transactions(user_id).unwrap(), 2);
    }

    #[test]
    fn test_duplicate_rows_within_one_file() {
        let (db, user_id) = setup();
        let csv = "Date,Description,Amount\n\
                   01/15/2024,NETFLIX.COM,-15.99\n\
                   01/15/2024,NETFLIX.COM,-15.99";
        let parsed = parse_csv(csv).unwrap();

        let summary = Importer::new(&db)
            .run(user_id, None, None, &parsed, &mapping())
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.duplicates, 1);
    }

    #[test]
    fn test_row_errors_do_not_abort() {
        let (db, user_id) = setup();
        let csv = "Date,Description,Amount\n\
                   01/15/2024,NETFLIX.COM,-15.99\n\
                   01/16/2024,MISSING AMOUNT,\n\
                   not-a-date,SHELL,-40.00\n\
                   01/17/2024,BAD AMOUNT,abc\n\
                   01/18/2024,STARBUCKS,-5.50";
        let parsed = parse_csv(csv).unwrap();

        let summary = Importer::new(&db)
            .run(user_id, None, None, &parsed, &mapping())
            .unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.errors, 3);
        assert_eq!(summary.duplicates, 0);
    }

    #[test]
    fn test_same_row_two_accounts_not_duplicate() {
        let (db, user_id) = setup();
        let checking = db.upsert_account(user_id, "Checking", None).unwrap();
        let savings = db.upsert_account(user_id, "Savings", None).unwrap();
        let csv = "Date,Description,Amount\n01/15/2024,TRANSFER IN,100.00";
        let parsed = parse_csv(csv).unwrap();
        let importer = Importer::new(&db);

        let first = importer
            .run(user_id, Some(checking), None, &parsed, &mapping())
            .unwrap();
        let second = importer
            .run(user_id, Some(savings), None, &parsed, &mapping())
            .unwrap();
        assert_eq!(first.imported, 1);
        assert_eq!(second.imported, 1);
        assert_eq!(second.duplicates, 0);
    }

    #[test]
    fn test_explicit_category_column_wins() {
        let (db, user_id) = setup();
        let dining = db.create_category(user_id, "Dining").unwrap();
        let groceries = db.create_category(user_id, "Groceries").unwrap();
        // A rule that would otherwise categorize Starbucks as groceries
        db.create_rule(
            user_id,
            &NewCategoryRule {
                merchant_pattern: "starbucks".to_string(),
                category_id: groceries,
                amount_min: None,
                amount_max: None,
                priority: 0,
                is_active: true,
            },
        )
        .unwrap();

        let csv = "Date,Description,Amount,Category\n\
                   01/15/2024,STARBUCKS #1234,-5.50,Dining\n\
                   01/16/2024,STARBUCKS #1234,-6.50,Nonexistent";
        let parsed = parse_csv(csv).unwrap();
        let mut mapping = mapping();
        mapping.category = Some("Category".to_string());

        Importer::new(&db)
            .run(user_id, None, None, &parsed, &mapping)
            .unwrap();

        let transactions = db.list_transactions(user_id, 10, 0).unwrap();
        let explicit = transactions.iter().find(|t| t.amount == -5.50).unwrap();
        assert_eq!(explicit.category_id, Some(dining));
        assert_eq!(explicit.classification_source, ClassificationSource::Manual);
        assert_eq!(explicit.classification_confidence, EXPLICIT_CONFIDENCE);

        // Unmatched category value falls through to the rule sweep
        let swept = transactions.iter().find(|t| t.amount == -6.50).unwrap();
        assert_eq!(swept.category_id, Some(groceries));
        assert_eq!(swept.classification_source, ClassificationSource::Rule);
    }

    #[test]
    fn test_sweep_runs_after_import() {
        let (db, user_id) = setup();
        let dining = db.create_category(user_id, "Dining").unwrap();
        db.create_rule(
            user_id,
            &NewCategoryRule {
                merchant_pattern: "starbucks".to_string(),
                category_id: dining,
                amount_min: None,
                amount_max: None,
                priority: 0,
                is_active: true,
            },
        )
        .unwrap();

        let csv = "Date,Description,Amount\n01/15/2024,STARBUCKS STORE 5678,-5.50";
        let parsed = parse_csv(csv).unwrap();
        Importer::new(&db)
            .run(user_id, None, None, &parsed, &mapping())
            .unwrap();

        let tx = &db.list_transactions(user_id, 10, 0).unwrap()[0];
        assert_eq!(tx.category_id, Some(dining));
        assert_eq!(tx.classification_source, ClassificationSource::Rule);
    }

    #[test]
    fn test_unknown_user_aborts() {
        let db = Database::in_memory().unwrap();
        let csv = "Date,Description,Amount\n01/15/2024,NETFLIX.COM,-15.99";
        let parsed = parse_csv(csv).unwrap();

        let result = Importer::new(&db).run(999, None, None, &parsed, &mapping());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_foreign_account_aborts() {
        let (db, alice) = setup();
        let bob = db.create_user("bob").unwrap();
        let bobs_account = db.upsert_account(bob, "Checking", None).unwrap();

        let csv = "Date,Description,Amount\n01/15/2024,NETFLIX.COM,-15.99";
        let parsed = parse_csv(csv).unwrap();

        let result =
            Importer::new(&db).run(alice, Some(bobs_account), None, &parsed, &mapping());
        assert!(result.is_err());
        // Nothing was written for the aborted run
        assert_eq!(db.count_transactions(alice).unwrap(), 0);
    }

    #[test]
    fn test_session_records_counts() {
        let (db, user_id) = setup();
        let csv = "Date,Description,Amount\n\
                   01/15/2024,NETFLIX.COM,-15.99\n\
                   01/16/2024,,-1.00";
        let parsed = parse_csv(csv).unwrap();

        Importer::new(&db)
            .run(user_id, None, Some("upload.csv"), &parsed, &mapping())
            .unwrap();

        let sessions = db.list_import_sessions(user_id, 10).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].filename.as_deref(), Some("upload.csv"));
        assert_eq!(sessions[0].imported, 1);
        assert_eq!(sessions[0].errors, 1);
        assert_eq!(sessions[0].total, 2);
    }
}
