//! Maintenance commands

use anyhow::Result;
use reckon_core::db::Database;
use reckon_core::regenerate_merchant_keys;

pub fn cmd_regen_keys(db: &Database, user_id: i64) -> Result<()> {
    let summary = regenerate_merchant_keys(db, user_id)?;
    println!("Merchant key regeneration complete");
    println!("  Updated:   {}", summary.updated);
    println!("  Unchanged: {}", summary.unchanged);
    println!("  Total:     {}", summary.total);
    Ok(())
}
