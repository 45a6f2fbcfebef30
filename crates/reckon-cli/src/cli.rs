//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reckon - Import, deduplicate and categorize bank transactions
#[derive(Parser)]
#[command(name = "reckon")]
#[command(about = "Personal finance transaction importer and categorizer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "reckon.db", global = true)]
    pub db: PathBuf,

    /// User profile to operate on (created on first use)
    #[arg(short, long, default_value = "default", global = true)]
    pub user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import transactions from a CSV export
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Account name to import into (created if missing)
        #[arg(short, long)]
        account: Option<String>,

        /// Override the detected date column
        #[arg(long)]
        date_col: Option<String>,

        /// Override the detected description column
        #[arg(long)]
        description_col: Option<String>,

        /// Override the detected amount column
        #[arg(long)]
        amount_col: Option<String>,

        /// Override the detected category column
        #[arg(long)]
        category_col: Option<String>,

        /// Show the detected column mapping and row count without importing
        #[arg(long)]
        dry_run: bool,

        /// Print the import summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show database status
    Status,

    /// List import history
    Sessions {
        /// Maximum sessions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage categorization rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Maintenance operations
    Maintenance {
        #[command(subcommand)]
        action: MaintenanceAction,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List accounts
    List,

    /// Add an account
    Add {
        /// Account name
        name: String,

        /// Institution label (e.g., "Chase")
        #[arg(long)]
        institution: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,

    /// Add a category
    Add {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Maximum transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Manually set a transaction's category (protected from rule sweeps)
    Categorize {
        /// Transaction id
        id: i64,

        /// Category name
        category: String,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in evaluation order
    List,

    /// Add a rule
    Add {
        /// Substring matched against merchant keys (case-insensitive)
        pattern: String,

        /// Category to assign on match
        category: String,

        /// Inclusive minimum absolute amount
        #[arg(long)]
        min: Option<f64>,

        /// Inclusive maximum absolute amount
        #[arg(long)]
        max: Option<f64>,

        /// Higher priority rules are evaluated first
        #[arg(short, long, default_value = "0")]
        priority: i32,

        /// Also apply the new rule to existing (non-manual) transactions
        #[arg(long)]
        reapply: bool,
    },

    /// Edit a rule
    Edit {
        /// Rule id
        id: i64,

        /// New pattern
        #[arg(long)]
        pattern: Option<String>,

        /// New category name
        #[arg(long)]
        category: Option<String>,

        /// New inclusive minimum absolute amount
        #[arg(long)]
        min: Option<f64>,

        /// New inclusive maximum absolute amount
        #[arg(long)]
        max: Option<f64>,

        /// New priority
        #[arg(long)]
        priority: Option<i32>,

        /// Also reapply the edited rule to existing (non-manual) transactions
        #[arg(long)]
        reapply: bool,
    },

    /// Delete a rule (matched transactions keep their category)
    Delete {
        /// Rule id
        id: i64,
    },

    /// Enable a rule
    Enable {
        /// Rule id
        id: i64,
    },

    /// Disable a rule without deleting it
    Disable {
        /// Rule id
        id: i64,
    },

    /// Show which rule, if any, would match a description
    Test {
        /// Transaction description to test
        description: String,

        /// Transaction amount to test bounds against
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        amount: f64,
    },
}

#[derive(Subcommand)]
pub enum MaintenanceAction {
    /// Recompute merchant keys for all transactions with the current algorithm
    RegenKeys,
}
