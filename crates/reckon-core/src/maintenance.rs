//! Maintenance operations

use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::merchant::merchant_key;
use crate::models::RegenerateSummary;

/// Recompute every merchant key for a user with the current algorithm
///
/// Run after the key derivation changes to bring stored keys up to date.
/// Safe to run repeatedly: keys that already match are left alone, so a
/// second pass reports `updated = 0`.
pub fn regenerate_merchant_keys(db: &Database, user_id: i64) -> Result<RegenerateSummary> {
    let rows = db.list_merchant_keys(user_id)?;
    let mut summary = RegenerateSummary {
        total: rows.len() as i64,
        ..Default::default()
    };

    for (id, description, current_key) in rows {
        let key = merchant_key(&description);
        if key == current_key {
            summary.unchanged += 1;
        } else {
            db.update_merchant_key(id, &key)?;
            summary.updated += 1;
        }
    }

    info!(
        "Merchant key regeneration: {} updated, {} unchanged of {}",
        summary.updated, summary.unchanged, summary.total
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InsertOutcome;
    use crate::models::{ClassificationSource, NewTransaction, TransactionType};
    use chrono::NaiveDate;

    fn insert_with_key(db: &Database, user_id: i64, description: &str, stored_key: &str) -> i64 {
        let tx = NewTransaction {
            posted_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: description.to_string(),
            amount: -10.0,
            txn_type: TransactionType::Debit,
            merchant_key: stored_key.to_string(),
            fingerprint_hash: format!("fp-{}", description),
            category_id: None,
            classification_source: ClassificationSource::Default,
            classification_confidence: 0.5,
            original_data: None,
        };
        match db.insert_transaction(user_id, None, None, &tx).unwrap() {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::Duplicate => unreachable!(),
        }
    }

    #[test]
    fn test_regenerates_stale_keys() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();

        // One key from an older algorithm revision, one already current
        let stale = insert_with_key(&db, user_id, "STARBUCKS #1234", "STARBUCKS #1234");
        insert_with_key(&db, user_id, "NETFLIX.COM", "NETFLIX");

        let summary = regenerate_merchant_keys(&db, user_id).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.unchanged, 1);

        let tx = db.get_transaction(stale).unwrap().unwrap();
        assert_eq!(tx.merchant_key, "STARBUCKS");
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        insert_with_key(&db, user_id, "STARBUCKS #1234", "old");
        insert_with_key(&db, user_id, "AMAZON.COM*TM0QZ6HK3", "old");

        let first = regenerate_merchant_keys(&db, user_id).unwrap();
        assert_eq!(first.updated, 2);

        let second = regenerate_merchant_keys(&db, user_id).unwrap();
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 2);
    }
}
