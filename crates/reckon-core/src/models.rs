//! Domain models for Reckon

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A user of the system
///
/// Everything downstream (accounts, categories, rules, transactions) is
/// partitioned by user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A bank account transactions can be imported into
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Free-text institution label (e.g., "Chase", "BECU")
    pub institution: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A spending category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// System categories (currently only "Uncategorized") cannot be deleted
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

/// Transaction direction, derived from the sign of the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// Amount >= 0 is a credit, negative is a debit
    pub fn from_amount(amount: f64) -> Self {
        if amount >= 0.0 {
            Self::Credit
        } else {
            Self::Debit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance of a transaction's category assignment
///
/// Automatic passes (the post-import sweep and rule reapplication) only ever
/// touch `Default` transactions; `Manual` is terminal with respect to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    /// No rule or user input yet; carries the fallback category
    #[default]
    Default,
    /// Assigned by an active categorization rule
    Rule,
    /// Set by the user (or by an explicit category column in the source file)
    Manual,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Rule => "rule",
            Self::Manual => "manual",
        }
    }
}

impl std::str::FromStr for ClassificationSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "rule" => Ok(Self::Rule),
            "manual" => Ok(Self::Manual),
            _ => Err(format!("Unknown classification source: {}", s)),
        }
    }
}

impl std::fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub posted_date: NaiveDate,
    /// Raw description as it appeared in the source file
    pub description: String,
    /// Negative = debit/expense, positive = credit
    pub amount: f64,
    pub txn_type: TransactionType,
    /// Normalized merchant identifier derived from the description
    pub merchant_key: String,
    /// Content hash for deduplication; immutable once stored
    pub fingerprint_hash: String,
    pub category_id: Option<i64>,
    pub classification_source: ClassificationSource,
    pub classification_confidence: f64,
    /// Original row data as a JSON object (for reprocessing)
    pub original_data: Option<String>,
    /// Which import this came from
    pub import_session_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A new transaction to be imported (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub posted_date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub txn_type: TransactionType,
    pub merchant_key: String,
    pub fingerprint_hash: String,
    pub category_id: Option<i64>,
    pub classification_source: ClassificationSource,
    pub classification_confidence: f64,
    pub original_data: Option<String>,
}

/// A user-defined categorization rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: i64,
    pub user_id: i64,
    /// Lowercased, trimmed substring matched against the merchant key
    pub merchant_pattern: String,
    pub category_id: i64,
    /// Inclusive lower bound on the absolute transaction amount
    pub amount_min: Option<f64>,
    /// Inclusive upper bound on the absolute transaction amount
    pub amount_max: Option<f64>,
    /// Higher priority rules are evaluated first
    pub priority: i32,
    pub is_active: bool,
    /// How many times this rule has assigned a category
    pub match_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A new rule to be created (pattern is normalized on insert)
#[derive(Debug, Clone)]
pub struct NewCategoryRule {
    pub merchant_pattern: String,
    pub category_id: i64,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub priority: i32,
    pub is_active: bool,
}

/// Aggregate outcome of one import run
///
/// `imported + duplicates + errors <= total`; rows skipped for missing
/// required fields are counted in `errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: i64,
    pub duplicates: i64,
    pub errors: i64,
    pub total: i64,
}

/// Outcome of a post-import categorization sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Default-classified transactions examined
    pub scanned: i64,
    /// Transactions a rule assigned a category to
    pub categorized: i64,
}

/// Outcome of reapplying a single rule to existing transactions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReapplySummary {
    /// Non-manual transactions examined
    pub scanned: i64,
    /// Transactions the rule recategorized
    pub updated: i64,
}

/// Outcome of the merchant key regeneration maintenance operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegenerateSummary {
    pub total: i64,
    pub updated: i64,
    pub unchanged: i64,
}

/// An import session record tracking a single upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    pub id: i64,
    pub user_id: i64,
    pub account_id: Option<i64>,
    pub filename: Option<String>,
    pub imported: i64,
    pub duplicates: i64,
    pub errors: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}
