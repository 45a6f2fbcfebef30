//! Reckon Core Library
//!
//! Shared functionality for the Reckon personal finance tool:
//! - Database access and migrations
//! - CSV parsing and column detection for bank exports
//! - Amount and date normalization
//! - Merchant key derivation from transaction descriptions
//! - Content fingerprints for duplicate detection
//! - Categorization rule engine
//! - The import orchestrator tying the pipeline together

pub mod db;
pub mod error;
pub mod fingerprint;
pub mod import;
pub mod maintenance;
pub mod merchant;
pub mod models;
pub mod normalize;
pub mod parse;
pub mod rules;

pub use db::Database;
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use import::Importer;
pub use maintenance::regenerate_merchant_keys;
pub use merchant::merchant_key;
pub use models::{ImportSummary, ReapplySummary, RegenerateSummary, SweepSummary};
pub use normalize::{parse_amount, DateParser};
pub use parse::{detect_columns, parse_csv, ColumnMapping, ParsedCsv};
pub use rules::RuleEngine;
