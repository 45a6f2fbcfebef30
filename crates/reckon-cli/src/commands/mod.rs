//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use reckon_core::db::Database;

pub mod accounts;
pub mod categories;
pub mod core;
pub mod import;
pub mod maintenance;
pub mod rules;
pub mod transactions;

// Re-export command functions for main.rs
pub use accounts::*;
pub use categories::*;
pub use core::*;
pub use import::*;
pub use maintenance::*;
pub use rules::*;
pub use transactions::*;

/// Open the database and resolve the user profile (creating it on first use)
pub fn open(db_path: &Path, user: &str) -> Result<(Database, i64)> {
    let path = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let db = Database::new(path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    let user_id = db
        .ensure_user(user)
        .with_context(|| format!("Failed to resolve user '{}'", user))?;
    Ok((db, user_id))
}
