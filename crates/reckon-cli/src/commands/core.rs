//! Init, status and import-history commands

use std::path::Path;

use anyhow::Result;
use reckon_core::models::ClassificationSource;

use super::open;

pub fn cmd_init(db_path: &Path, user: &str) -> Result<()> {
    let (db, _) = open(db_path, user)?;
    println!("Initialized database at {}", db.path());
    println!("User profile: {}", user);
    Ok(())
}

pub fn cmd_status(db_path: &Path, user: &str) -> Result<()> {
    let (db, user_id) = open(db_path, user)?;

    let total = db.count_transactions(user_id)?;
    let uncategorized = db.count_by_source(user_id, ClassificationSource::Default)?;
    let by_rule = db.count_by_source(user_id, ClassificationSource::Rule)?;
    let manual = db.count_by_source(user_id, ClassificationSource::Manual)?;
    let accounts = db.list_accounts(user_id)?;
    let rules = db.list_rules(user_id)?;

    println!("Database: {}", db.path());
    println!("User: {}", user);
    println!("Accounts: {}", accounts.len());
    println!("Rules: {} ({} active)", rules.len(), rules.iter().filter(|r| r.is_active).count());
    println!("Transactions: {}", total);
    println!("  by rule:       {}", by_rule);
    println!("  manual:        {}", manual);
    println!("  uncategorized: {}", uncategorized);
    Ok(())
}

pub fn cmd_sessions(db_path: &Path, user: &str, limit: i64) -> Result<()> {
    let (db, user_id) = open(db_path, user)?;
    let sessions = db.list_import_sessions(user_id, limit)?;

    if sessions.is_empty() {
        println!("No imports yet");
        return Ok(());
    }

    println!(
        "{:<6} {:<20} {:<30} {:>9} {:>11} {:>7} {:>6}",
        "ID", "WHEN", "FILE", "IMPORTED", "DUPLICATES", "ERRORS", "TOTAL"
    );
    for session in sessions {
        println!(
            "{:<6} {:<20} {:<30} {:>9} {:>11} {:>7} {:>6}",
            session.id,
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.filename.as_deref().unwrap_or("-"),
            session.imported,
            session.duplicates,
            session.errors,
            session.total,
        );
    }
    Ok(())
}
