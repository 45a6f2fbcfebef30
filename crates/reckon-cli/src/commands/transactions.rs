//! Transaction commands

use anyhow::{Context, Result};
use reckon_core::db::Database;

pub fn cmd_transactions_list(db: &Database, user_id: i64, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(user_id, limit, 0)?;
    if transactions.is_empty() {
        println!("No transactions. Import some with: reckon import --file <csv>");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<28} {:>10} {:<20} {:<8}",
        "ID", "DATE", "MERCHANT", "AMOUNT", "CATEGORY", "SOURCE"
    );
    for tx in transactions {
        let category = match tx.category_id {
            Some(id) => db
                .get_category(id)?
                .map(|c| c.name)
                .unwrap_or_else(|| format!("#{}", id)),
            None => "-".to_string(),
        };
        println!(
            "{:<6} {:<12} {:<28} {:>10.2} {:<20} {:<8}",
            tx.id,
            tx.posted_date,
            truncate(&tx.merchant_key, 28),
            tx.amount,
            truncate(&category, 20),
            tx.classification_source,
        );
    }
    Ok(())
}

pub fn cmd_transactions_categorize(
    db: &Database,
    user_id: i64,
    transaction_id: i64,
    category_name: &str,
) -> Result<()> {
    let category = db
        .get_category_by_name(user_id, category_name)?
        .with_context(|| format!("No category named '{}'", category_name))?;

    db.set_manual_category(user_id, transaction_id, category.id)?;
    println!(
        "Transaction {} categorized as {} (manual, protected from rule sweeps)",
        transaction_id, category.name
    );
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
