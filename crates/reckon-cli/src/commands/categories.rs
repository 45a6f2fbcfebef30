//! Category commands

use anyhow::Result;
use reckon_core::db::Database;

pub fn cmd_categories_list(db: &Database, user_id: i64) -> Result<()> {
    let categories = db.list_categories(user_id)?;

    println!("{:<6} {:<24} {}", "ID", "NAME", "KIND");
    for category in categories {
        println!(
            "{:<6} {:<24} {}",
            category.id,
            category.name,
            if category.is_system { "system" } else { "" }
        );
    }
    Ok(())
}

pub fn cmd_categories_add(db: &Database, user_id: i64, name: &str) -> Result<()> {
    let id = db.create_category(user_id, name)?;
    println!("Created category '{}' (id {})", name.trim(), id);
    Ok(())
}
