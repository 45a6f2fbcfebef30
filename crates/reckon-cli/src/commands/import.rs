//! Import command implementation

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use reckon_core::parse::{detect_columns, parse_csv, ColumnMapping};
use reckon_core::Importer;

use super::open;

/// Caller-supplied column overrides; anything left unset falls back to
/// detection
#[derive(Debug, Default)]
pub struct MappingOverrides {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
}

pub fn cmd_import(
    db_path: &Path,
    user: &str,
    file: &Path,
    account_name: Option<&str>,
    overrides: &MappingOverrides,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let parsed = parse_csv(&text).with_context(|| format!("Failed to parse {}", file.display()))?;

    let mapping = resolve_mapping(&parsed.headers, overrides)?;

    if !json {
        println!("Importing {} ({} rows)", file.display(), parsed.rows.len());
        println!(
            "Columns: date={}, description={}, amount={}, category={}",
            mapping.posted_date,
            mapping.description,
            mapping.amount,
            mapping.category.as_deref().unwrap_or("-")
        );
    }

    if dry_run {
        println!("Dry run, nothing imported");
        return Ok(());
    }

    let (db, user_id) = open(db_path, user)?;
    let account_id = match account_name {
        Some(name) => Some(db.upsert_account(user_id, name, None)?),
        None => None,
    };

    let filename = file.file_name().and_then(|n| n.to_str());
    let summary = Importer::new(&db).run(user_id, account_id, filename, &parsed, &mapping)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Import complete");
        println!("  Imported:   {}", summary.imported);
        println!("  Duplicates: {}", summary.duplicates);
        println!("  Errors:     {}", summary.errors);
        println!("  Total rows: {}", summary.total);
    }
    Ok(())
}

/// Combine detection with explicit overrides into a confirmed mapping
fn resolve_mapping(headers: &[String], overrides: &MappingOverrides) -> Result<ColumnMapping> {
    let mut guess = detect_columns(headers);

    if let Some(ref date) = overrides.date {
        guess.posted_date = Some(resolve_header(headers, date)?);
    }
    if let Some(ref description) = overrides.description {
        guess.description = Some(resolve_header(headers, description)?);
    }
    if let Some(ref amount) = overrides.amount {
        guess.amount = Some(resolve_header(headers, amount)?);
    }
    if let Some(ref category) = overrides.category {
        guess.category = Some(resolve_header(headers, category)?);
    }

    match guess.clone().confirm() {
        Some(mapping) => Ok(mapping),
        None => {
            let mut missing = Vec::new();
            if guess.posted_date.is_none() {
                missing.push("date (--date-col)");
            }
            if guess.description.is_none() {
                missing.push("description (--description-col)");
            }
            if guess.amount.is_none() {
                missing.push("amount (--amount-col)");
            }
            bail!(
                "Could not detect columns for: {}. File headers: {}",
                missing.join(", "),
                headers.join(", ")
            )
        }
    }
}

/// Match an override against the file's headers, case-insensitively
fn resolve_header(headers: &[String], wanted: &str) -> Result<String> {
    headers
        .iter()
        .find(|h| h.eq_ignore_ascii_case(wanted.trim()))
        .cloned()
        .with_context(|| format!("No column named '{}' in the file", wanted))
}
