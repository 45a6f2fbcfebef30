//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `users` - User records and system category seeding
//! - `accounts` - Bank account operations
//! - `categories` - Category CRUD and lookup
//! - `rules` - Categorization rule CRUD and match counters
//! - `transactions` - Transaction inserts (duplicate-aware) and queries
//! - `sessions` - Import session audit trail

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod accounts;
mod categories;
mod rules;
mod sessions;
mod transactions;
mod users;

pub use transactions::InsertOutcome;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
///
/// Constructed explicitly and passed by reference into the orchestrator and
/// rule engine; there is no module-level client.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because every pooled
    /// connection to `:memory:` would see its own private database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/reckon_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Users (everything below is partitioned by user)
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Accounts (bank accounts)
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                institution TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

            -- Categories ("Uncategorized" is seeded per user with is_system = 1)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                is_system BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id);

            -- Categorization rules; pattern is stored lowercased and trimmed
            CREATE TABLE IF NOT EXISTS category_rules (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                merchant_pattern TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id),
                amount_min REAL,
                amount_max REAL,
                priority INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                match_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, merchant_pattern)
            );

            CREATE INDEX IF NOT EXISTS idx_rules_user_priority ON category_rules(user_id, priority DESC);

            -- Import sessions (one per upload)
            CREATE TABLE IF NOT EXISTS import_sessions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                account_id INTEGER REFERENCES accounts(id),
                filename TEXT,
                imported INTEGER NOT NULL DEFAULT 0,
                duplicates INTEGER NOT NULL DEFAULT 0,
                errors INTEGER NOT NULL DEFAULT 0,
                total INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user ON import_sessions(user_id);

            -- Transactions; the unique index on (user_id, fingerprint_hash) is
            -- the duplicate-detection mechanism
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                account_id INTEGER REFERENCES accounts(id),
                posted_date DATE NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                txn_type TEXT NOT NULL,                    -- credit | debit
                merchant_key TEXT NOT NULL,
                fingerprint_hash TEXT NOT NULL,
                category_id INTEGER REFERENCES categories(id),
                classification_source TEXT NOT NULL DEFAULT 'default',
                classification_confidence REAL NOT NULL DEFAULT 0.5,
                original_data TEXT,                        -- JSON of original row
                import_session_id INTEGER REFERENCES import_sessions(id),
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, fingerprint_hash)
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, posted_date);
            CREATE INDEX IF NOT EXISTS idx_transactions_merchant ON transactions(user_id, merchant_key);
            CREATE INDEX IF NOT EXISTS idx_transactions_source ON transactions(user_id, classification_source);
            CREATE INDEX IF NOT EXISTS idx_transactions_session ON transactions(import_session_id);
            "#,
        )?;

        info!("Database migrations complete");
        Ok(())
    }
}
