//! Categorization rule engine
//!
//! Matching is a pure fold over the user's priority-sorted rules: first
//! active rule whose pattern is a case-insensitive substring of the merchant
//! key and whose amount bounds hold wins. The `match_count` bump is a
//! separate write step performed after the pure decision, so the matching
//! algorithm itself stays side-effect free and unit-testable.
//!
//! Two invocation contexts touch the store:
//! - the post-import sweep over a session's still-default transactions
//! - reapply-to-existing, which runs one rule over all non-manual history
//!
//! Neither ever overwrites a `manual` classification.

use std::collections::HashMap;

use tracing::debug;

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    Category, CategoryRule, ClassificationSource, ReapplySummary, SweepSummary,
};

/// Confidence recorded when a rule assigns a category
pub const RULE_CONFIDENCE: f64 = 0.9;

/// Confidence of the default/uncategorized fallback
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Confidence when the source file carried an explicit category
pub const EXPLICIT_CONFIDENCE: f64 = 1.0;

/// Find the first rule matching a transaction, if any
///
/// `rules` must already be in evaluation order (priority descending, ties by
/// creation); the store's rule listing provides exactly that. First match
/// wins — not best match. Amount bounds are inclusive and compared against
/// the absolute amount, so bounds read naturally for expenses stored as
/// negative values.
pub fn match_rules<'a>(
    rules: &'a [CategoryRule],
    merchant_key: &str,
    amount: f64,
) -> Option<&'a CategoryRule> {
    let key = merchant_key.to_lowercase();
    let magnitude = amount.abs();

    rules.iter().filter(|rule| rule.is_active).find(|rule| {
        key.contains(&rule.merchant_pattern)
            && rule.amount_min.map_or(true, |min| magnitude >= min)
            && rule.amount_max.map_or(true, |max| magnitude <= max)
    })
}

/// Match a raw category cell from the source file against the user's
/// categories (case-insensitive, trimmed)
///
/// Explicit source data outranks inferred rules: a hit here is recorded as a
/// manual-grade classification.
pub fn match_category_name(categories: &[Category], raw: &str) -> Option<i64> {
    let wanted = raw.trim();
    if wanted.is_empty() {
        return None;
    }
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(wanted))
        .map(|c| c.id)
}

/// Rule engine bound to a database handle
pub struct RuleEngine<'a> {
    db: &'a Database,
}

impl<'a> RuleEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Post-import sweep: run the full active rule set once over a session's
    /// newly inserted, still-default transactions
    pub fn sweep_session(&self, user_id: i64, import_session_id: i64) -> Result<SweepSummary> {
        let rules = self.db.list_rules(user_id)?;
        let pending = self
            .db
            .default_classified_for_session(user_id, import_session_id)?;

        let mut summary = SweepSummary {
            scanned: pending.len() as i64,
            categorized: 0,
        };
        if rules.is_empty() || pending.is_empty() {
            return Ok(summary);
        }

        let mut hits: HashMap<i64, i64> = HashMap::new();
        for tx in &pending {
            if let Some(rule) = match_rules(&rules, &tx.merchant_key, tx.amount) {
                debug!(
                    "Rule '{}' categorizes transaction {} ({})",
                    rule.merchant_pattern, tx.id, tx.merchant_key
                );
                self.db.update_classification(
                    tx.id,
                    Some(rule.category_id),
                    ClassificationSource::Rule,
                    RULE_CONFIDENCE,
                )?;
                *hits.entry(rule.id).or_insert(0) += 1;
                summary.categorized += 1;
            }
        }

        for (rule_id, count) in hits {
            self.db.increment_rule_matches(rule_id, count)?;
        }

        Ok(summary)
    }

    /// Reapply one rule (just created or edited) across the user's history
    ///
    /// Scans every transaction except those classified `manual`; matches are
    /// re-pointed at the rule's category. An inactive rule matches nothing.
    pub fn reapply_rule(&self, user_id: i64, rule_id: i64) -> Result<ReapplySummary> {
        let rule = self
            .db
            .get_rule(user_id, rule_id)?
            .ok_or_else(|| crate::error::Error::NotFound(format!("Rule {}", rule_id)))?;

        let candidates = self.db.non_manual_transactions(user_id)?;
        let mut summary = ReapplySummary {
            scanned: candidates.len() as i64,
            updated: 0,
        };

        let single = [rule];
        for tx in &candidates {
            if match_rules(&single, &tx.merchant_key, tx.amount).is_some() {
                self.db.update_classification(
                    tx.id,
                    Some(single[0].category_id),
                    ClassificationSource::Rule,
                    RULE_CONFIDENCE,
                )?;
                summary.updated += 1;
            }
        }

        if summary.updated > 0 {
            self.db.increment_rule_matches(rule_id, summary.updated)?;
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InsertOutcome;
    use crate::models::{NewCategoryRule, NewTransaction, TransactionType};
    use chrono::NaiveDate;

    fn rule(id: i64, pattern: &str, category_id: i64, priority: i32) -> CategoryRule {
        CategoryRule {
            id,
            user_id: 1,
            merchant_pattern: pattern.to_string(),
            category_id,
            amount_min: None,
            amount_max: None,
            priority,
            is_active: true,
            match_count: 0,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        // Evaluation order is the slice order (priority-sorted by the caller)
        let rules = vec![rule(1, "uber", 10, 100), rule(2, "uber eats", 20, 50)];
        let matched = match_rules(&rules, "UBER EATS DELIVERY", -25.0).unwrap();
        assert_eq!(matched.id, 1);
    }

    #[test]
    fn test_substring_is_case_insensitive() {
        let rules = vec![rule(1, "netflix", 10, 0)];
        assert!(match_rules(&rules, "NETFLIX", -15.99).is_some());
        assert!(match_rules(&rules, "Netflix Membership", -15.99).is_some());
        assert!(match_rules(&rules, "HULU", -15.99).is_none());
    }

    #[test]
    fn test_inactive_rules_skipped() {
        let mut inactive = rule(1, "netflix", 10, 0);
        inactive.is_active = false;
        let rules = vec![inactive, rule(2, "netflix", 20, 0)];
        let matched = match_rules(&rules, "NETFLIX", -15.99).unwrap();
        assert_eq!(matched.id, 2);
    }

    #[test]
    fn test_amount_bounds_inclusive() {
        let mut bounded = rule(1, "chevron", 10, 0);
        bounded.amount_min = Some(50.0);
        bounded.amount_max = Some(100.0);
        let rules = vec![bounded];

        // Expenses are negative; bounds apply to the magnitude
        assert!(match_rules(&rules, "CHEVRON", -75.0).is_some());
        assert!(match_rules(&rules, "CHEVRON", -50.0).is_some());
        assert!(match_rules(&rules, "CHEVRON", -100.0).is_some());
        assert!(match_rules(&rules, "CHEVRON", -10.0).is_none());
        assert!(match_rules(&rules, "CHEVRON", -150.0).is_none());
    }

    #[test]
    fn test_match_category_name() {
        let categories = vec![
            Category {
                id: 1,
                user_id: 1,
                name: "Groceries".to_string(),
                is_system: false,
                created_at: chrono::Utc::now(),
            },
            Category {
                id: 2,
                user_id: 1,
                name: "Dining".to_string(),
                is_system: false,
                created_at: chrono::Utc::now(),
            },
        ];

        assert_eq!(match_category_name(&categories, "dining"), Some(2));
        assert_eq!(match_category_name(&categories, " Groceries "), Some(1));
        assert_eq!(match_category_name(&categories, "Travel"), None);
        assert_eq!(match_category_name(&categories, ""), None);
    }

    // --- store-backed engine tests ---

    fn insert_tx(
        db: &Database,
        user_id: i64,
        session_id: Option<i64>,
        fingerprint: &str,
        merchant_key: &str,
        amount: f64,
        category_id: i64,
    ) -> i64 {
        let tx = NewTransaction {
            posted_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            description: merchant_key.to_string(),
            amount,
            txn_type: TransactionType::from_amount(amount),
            merchant_key: merchant_key.to_string(),
            fingerprint_hash: fingerprint.to_string(),
            category_id: Some(category_id),
            classification_source: ClassificationSource::Default,
            classification_confidence: DEFAULT_CONFIDENCE,
            original_data: None,
        };
        match db.insert_transaction(user_id, None, session_id, &tx).unwrap() {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::Duplicate => unreachable!(),
        }
    }

    fn new_rule(pattern: &str, category_id: i64, priority: i32) -> NewCategoryRule {
        NewCategoryRule {
            merchant_pattern: pattern.to_string(),
            category_id,
            amount_min: None,
            amount_max: None,
            priority,
            is_active: true,
        }
    }

    #[test]
    fn test_sweep_assigns_and_counts() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        let fallback = db.uncategorized_category(user_id).unwrap();
        let dining = db.create_category(user_id, "Dining").unwrap();
        let session = db.create_import_session(user_id, None, None).unwrap();

        let rule_id = db.create_rule(user_id, &new_rule("starbucks", dining, 0)).unwrap();
        let hit = insert_tx(&db, user_id, Some(session), "h1", "STARBUCKS", -5.5, fallback.id);
        let miss = insert_tx(&db, user_id, Some(session), "h2", "SHELL", -40.0, fallback.id);

        let summary = RuleEngine::new(&db).sweep_session(user_id, session).unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.categorized, 1);

        let hit_tx = db.get_transaction(hit).unwrap().unwrap();
        assert_eq!(hit_tx.category_id, Some(dining));
        assert_eq!(hit_tx.classification_source, ClassificationSource::Rule);
        assert_eq!(hit_tx.classification_confidence, RULE_CONFIDENCE);

        let miss_tx = db.get_transaction(miss).unwrap().unwrap();
        assert_eq!(miss_tx.classification_source, ClassificationSource::Default);

        let rule = db.get_rule(user_id, rule_id).unwrap().unwrap();
        assert_eq!(rule.match_count, 1);
    }

    #[test]
    fn test_sweep_only_touches_its_session() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        let fallback = db.uncategorized_category(user_id).unwrap();
        let dining = db.create_category(user_id, "Dining").unwrap();
        db.create_rule(user_id, &new_rule("starbucks", dining, 0)).unwrap();

        let old_session = db.create_import_session(user_id, None, None).unwrap();
        let old = insert_tx(&db, user_id, Some(old_session), "h1", "STARBUCKS", -5.5, fallback.id);

        let new_session = db.create_import_session(user_id, None, None).unwrap();
        insert_tx(&db, user_id, Some(new_session), "h2", "STARBUCKS", -6.5, fallback.id);

        let summary = RuleEngine::new(&db).sweep_session(user_id, new_session).unwrap();
        assert_eq!(summary.scanned, 1);

        // The earlier import is untouched by this sweep
        let old_tx = db.get_transaction(old).unwrap().unwrap();
        assert_eq!(old_tx.classification_source, ClassificationSource::Default);
    }

    #[test]
    fn test_sweep_never_touches_manual() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        let fallback = db.uncategorized_category(user_id).unwrap();
        let dining = db.create_category(user_id, "Dining").unwrap();
        let travel = db.create_category(user_id, "Travel").unwrap();
        let session = db.create_import_session(user_id, None, None).unwrap();

        db.create_rule(user_id, &new_rule("starbucks", dining, 0)).unwrap();
        let id = insert_tx(&db, user_id, Some(session), "h1", "STARBUCKS", -5.5, fallback.id);
        db.set_manual_category(user_id, id, travel).unwrap();

        let summary = RuleEngine::new(&db).sweep_session(user_id, session).unwrap();
        assert_eq!(summary.scanned, 0);
        assert_eq!(summary.categorized, 0);

        let tx = db.get_transaction(id).unwrap().unwrap();
        assert_eq!(tx.category_id, Some(travel));
        assert_eq!(tx.classification_source, ClassificationSource::Manual);
    }

    #[test]
    fn test_priority_order_in_sweep() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        let fallback = db.uncategorized_category(user_id).unwrap();
        let transport = db.create_category(user_id, "Transport").unwrap();
        let dining = db.create_category(user_id, "Dining").unwrap();
        let session = db.create_import_session(user_id, None, None).unwrap();

        db.create_rule(user_id, &new_rule("uber eats", dining, 50)).unwrap();
        db.create_rule(user_id, &new_rule("uber", transport, 100)).unwrap();
        let id = insert_tx(&db, user_id, Some(session), "h1", "UBER EATS", -25.0, fallback.id);

        RuleEngine::new(&db).sweep_session(user_id, session).unwrap();
        let tx = db.get_transaction(id).unwrap().unwrap();
        // Higher priority (100) wins even though both match
        assert_eq!(tx.category_id, Some(transport));
    }

    #[test]
    fn test_reapply_excludes_manual_and_counts() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        let fallback = db.uncategorized_category(user_id).unwrap();
        let dining = db.create_category(user_id, "Dining").unwrap();
        let travel = db.create_category(user_id, "Travel").unwrap();

        let a = insert_tx(&db, user_id, None, "h1", "STARBUCKS", -5.5, fallback.id);
        let b = insert_tx(&db, user_id, None, "h2", "STARBUCKS RESERVE", -9.0, fallback.id);
        let manual = insert_tx(&db, user_id, None, "h3", "STARBUCKS", -4.0, fallback.id);
        db.set_manual_category(user_id, manual, travel).unwrap();

        let rule_id = db.create_rule(user_id, &new_rule("starbucks", dining, 0)).unwrap();
        let summary = RuleEngine::new(&db).reapply_rule(user_id, rule_id).unwrap();

        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.updated, 2);

        for id in [a, b] {
            let tx = db.get_transaction(id).unwrap().unwrap();
            assert_eq!(tx.category_id, Some(dining));
            assert_eq!(tx.classification_source, ClassificationSource::Rule);
        }
        let untouched = db.get_transaction(manual).unwrap().unwrap();
        assert_eq!(untouched.category_id, Some(travel));

        let rule = db.get_rule(user_id, rule_id).unwrap().unwrap();
        assert_eq!(rule.match_count, 2);
    }

    #[test]
    fn test_reapply_inactive_rule_matches_nothing() {
        let db = Database::in_memory().unwrap();
        let user_id = db.create_user("alice").unwrap();
        let fallback = db.uncategorized_category(user_id).unwrap();
        let dining = db.create_category(user_id, "Dining").unwrap();

        insert_tx(&db, user_id, None, "h1", "STARBUCKS", -5.5, fallback.id);

        let mut rule = new_rule("starbucks", dining, 0);
        rule.is_active = false;
        let rule_id = db.create_rule(user_id, &rule).unwrap();

        let summary = RuleEngine::new(&db).reapply_rule(user_id, rule_id).unwrap();
        assert_eq!(summary.updated, 0);
    }
}
