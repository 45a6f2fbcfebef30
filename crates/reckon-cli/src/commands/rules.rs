//! Rule commands

use anyhow::{Context, Result};
use reckon_core::db::Database;
use reckon_core::merchant_key;
use reckon_core::models::NewCategoryRule;
use reckon_core::rules::{match_rules, RuleEngine};

pub fn cmd_rules_list(db: &Database, user_id: i64) -> Result<()> {
    let rules = db.list_rules(user_id)?;
    if rules.is_empty() {
        println!("No rules. Add one with: reckon rules add <pattern> <category>");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<10} {:<8} {:<8} {:>8} {:>8} {:>8}",
        "ID", "PATTERN", "CATEGORY", "PRIORITY", "ACTIVE", "MIN", "MAX", "MATCHES"
    );
    for rule in rules {
        let category = db
            .get_category(rule.category_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| format!("#{}", rule.category_id));
        println!(
            "{:<6} {:<24} {:<10} {:<8} {:<8} {:>8} {:>8} {:>8}",
            rule.id,
            rule.merchant_pattern,
            category,
            rule.priority,
            if rule.is_active { "yes" } else { "no" },
            rule.amount_min.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into()),
            rule.amount_max.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into()),
            rule.match_count,
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_rules_add(
    db: &Database,
    user_id: i64,
    pattern: &str,
    category_name: &str,
    amount_min: Option<f64>,
    amount_max: Option<f64>,
    priority: i32,
    reapply: bool,
) -> Result<()> {
    let category = db
        .get_category_by_name(user_id, category_name)?
        .with_context(|| format!("No category named '{}'", category_name))?;

    let rule_id = db.create_rule(
        user_id,
        &NewCategoryRule {
            merchant_pattern: pattern.to_string(),
            category_id: category.id,
            amount_min,
            amount_max,
            priority,
            is_active: true,
        },
    )?;
    println!("Created rule {} -> {}", pattern.trim().to_lowercase(), category.name);

    if reapply {
        let summary = RuleEngine::new(db).reapply_rule(user_id, rule_id)?;
        println!(
            "Reapplied to existing: {} of {} transactions updated",
            summary.updated, summary.scanned
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_rules_edit(
    db: &Database,
    user_id: i64,
    rule_id: i64,
    pattern: Option<&str>,
    category_name: Option<&str>,
    amount_min: Option<f64>,
    amount_max: Option<f64>,
    priority: Option<i32>,
    reapply: bool,
) -> Result<()> {
    let category_id = match category_name {
        Some(name) => Some(
            db.get_category_by_name(user_id, name)?
                .with_context(|| format!("No category named '{}'", name))?
                .id,
        ),
        None => None,
    };

    db.update_rule(
        user_id,
        rule_id,
        pattern,
        category_id,
        amount_min.map(Some),
        amount_max.map(Some),
        priority,
        None,
    )?;
    println!("Updated rule {}", rule_id);

    if reapply {
        let summary = RuleEngine::new(db).reapply_rule(user_id, rule_id)?;
        println!(
            "Reapplied to existing: {} of {} transactions updated",
            summary.updated, summary.scanned
        );
    }
    Ok(())
}

pub fn cmd_rules_delete(db: &Database, user_id: i64, rule_id: i64) -> Result<()> {
    db.delete_rule(user_id, rule_id)?;
    println!("Deleted rule {} (already-categorized transactions are unchanged)", rule_id);
    Ok(())
}

pub fn cmd_rules_set_active(db: &Database, user_id: i64, rule_id: i64, active: bool) -> Result<()> {
    db.update_rule(user_id, rule_id, None, None, None, None, None, Some(active))?;
    println!(
        "Rule {} {}",
        rule_id,
        if active { "enabled" } else { "disabled" }
    );
    Ok(())
}

pub fn cmd_rules_test(db: &Database, user_id: i64, description: &str, amount: f64) -> Result<()> {
    let key = merchant_key(description);
    println!("Merchant key: {}", key);

    let rules = db.list_rules(user_id)?;
    match match_rules(&rules, &key, amount) {
        Some(rule) => {
            let category = db
                .get_category(rule.category_id)?
                .map(|c| c.name)
                .unwrap_or_else(|| format!("#{}", rule.category_id));
            println!(
                "Matches rule {} ('{}', priority {}) -> {}",
                rule.id, rule.merchant_pattern, rule.priority, category
            );
        }
        None => println!("No rule matches"),
    }
    Ok(())
}
