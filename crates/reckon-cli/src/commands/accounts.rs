//! Account commands

use anyhow::Result;
use reckon_core::db::Database;

pub fn cmd_accounts_list(db: &Database, user_id: i64) -> Result<()> {
    let accounts = db.list_accounts(user_id)?;
    if accounts.is_empty() {
        println!("No accounts. Add one with: reckon accounts add <name>");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<16}", "ID", "NAME", "INSTITUTION");
    for account in accounts {
        println!(
            "{:<6} {:<24} {:<16}",
            account.id,
            account.name,
            account.institution.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn cmd_accounts_add(
    db: &Database,
    user_id: i64,
    name: &str,
    institution: Option<&str>,
) -> Result<()> {
    let id = db.upsert_account(user_id, name, institution)?;
    println!("Account '{}' ready (id {})", name, id);
    Ok(())
}
