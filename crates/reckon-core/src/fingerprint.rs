//! Content fingerprints for duplicate detection
//!
//! Bank CSV exports carry no transaction id that survives re-export, so
//! identity is reconstructed from content. The fingerprint is the sole
//! duplicate-detection key: the store enforces it with a unique index and a
//! constraint violation on insert means "already imported". Once stored it is
//! never recomputed — later recategorization must not change a transaction's
//! identity.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Compute the deduplication fingerprint for a transaction
///
/// Deterministic over (date, description, amount, account). The account id is
/// folded in when present so the same row imported into two accounts does not
/// collide.
pub fn fingerprint(
    posted_date: NaiveDate,
    amount: f64,
    description: &str,
    account_id: Option<i64>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(posted_date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    if let Some(id) = account_id {
        hasher.update(id.to_be_bytes());
    }
    hex::encode(hasher.finalize())
}
