//! Reckon CLI - Bank CSV importer and categorizer
//!
//! Usage:
//!   reckon init                      Initialize database
//!   reckon import --file export.csv  Import transactions (columns auto-detected)
//!   reckon rules add netflix Streaming --reapply
//!   reckon maintenance regen-keys    Recompute merchant keys

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, &cli.user),
        Commands::Import {
            file,
            account,
            date_col,
            description_col,
            amount_col,
            category_col,
            dry_run,
            json,
        } => {
            let overrides = commands::MappingOverrides {
                date: date_col,
                description: description_col,
                amount: amount_col,
                category: category_col,
            };
            commands::cmd_import(
                &cli.db,
                &cli.user,
                &file,
                account.as_deref(),
                &overrides,
                dry_run,
                json,
            )
        }
        Commands::Status => commands::cmd_status(&cli.db, &cli.user),
        Commands::Sessions { limit } => commands::cmd_sessions(&cli.db, &cli.user, limit),
        Commands::Accounts { action } => {
            let (db, user_id) = commands::open(&cli.db, &cli.user)?;
            match action {
                None | Some(AccountsAction::List) => commands::cmd_accounts_list(&db, user_id),
                Some(AccountsAction::Add { name, institution }) => {
                    commands::cmd_accounts_add(&db, user_id, &name, institution.as_deref())
                }
            }
        }
        Commands::Categories { action } => {
            let (db, user_id) = commands::open(&cli.db, &cli.user)?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db, user_id),
                Some(CategoriesAction::Add { name }) => {
                    commands::cmd_categories_add(&db, user_id, &name)
                }
            }
        }
        Commands::Transactions { action } => {
            let (db, user_id) = commands::open(&cli.db, &cli.user)?;
            match action {
                None => commands::cmd_transactions_list(&db, user_id, 20),
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&db, user_id, limit)
                }
                Some(TransactionsAction::Categorize { id, category }) => {
                    commands::cmd_transactions_categorize(&db, user_id, id, &category)
                }
            }
        }
        Commands::Rules { action } => {
            let (db, user_id) = commands::open(&cli.db, &cli.user)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&db, user_id),
                Some(RulesAction::Add {
                    pattern,
                    category,
                    min,
                    max,
                    priority,
                    reapply,
                }) => commands::cmd_rules_add(
                    &db, user_id, &pattern, &category, min, max, priority, reapply,
                ),
                Some(RulesAction::Edit {
                    id,
                    pattern,
                    category,
                    min,
                    max,
                    priority,
                    reapply,
                }) => commands::cmd_rules_edit(
                    &db,
                    user_id,
                    id,
                    pattern.as_deref(),
                    category.as_deref(),
                    min,
                    max,
                    priority,
                    reapply,
                ),
                Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&db, user_id, id),
                Some(RulesAction::Enable { id }) => {
                    commands::cmd_rules_set_active(&db, user_id, id, true)
                }
                Some(RulesAction::Disable { id }) => {
                    commands::cmd_rules_set_active(&db, user_id, id, false)
                }
                Some(RulesAction::Test {
                    description,
                    amount,
                }) => commands::cmd_rules_test(&db, user_id, &description, amount),
            }
        }
        Commands::Maintenance { action } => {
            let (db, user_id) = commands::open(&cli.db, &cli.user)?;
            match action {
                MaintenanceAction::RegenKeys => commands::cmd_regen_keys(&db, user_id),
            }
        }
    }
}
