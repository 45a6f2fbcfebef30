//! CSV parsing and column detection for bank exports
//!
//! Bank CSVs vary wildly in shape, so parsing is deliberately forgiving:
//! quoted fields may contain commas and newlines, ragged rows are tolerated,
//! and blank or malformed lines are dropped rather than failing the file.
//! The only hard failure is a file with zero usable data rows.

use std::collections::{HashMap, HashSet};

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};

/// One data line, keyed by header name
pub type CsvRow = HashMap<String, String>;

/// The result of parsing a CSV file
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    /// Column names in file order, first occurrence wins on duplicates
    pub headers: Vec<String>,
    /// Data rows in file order
    pub rows: Vec<CsvRow>,
}

/// Parse raw CSV text into headers and row mappings
///
/// The first row is treated as the header row. Fails only when no data rows
/// survive parsing.
pub fn parse_csv(text: &str) -> Result<ParsedCsv> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let raw_headers = rdr.headers()?.clone();
    let mut headers = Vec::new();
    let mut seen = HashSet::new();
    for header in raw_headers.iter() {
        let header = header.trim();
        if !header.is_empty() && seen.insert(header.to_string()) {
            headers.push(header.to_string());
        }
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping malformed CSV line: {}", e);
                skipped += 1;
                continue;
            }
        };

        if record.iter().all(|cell| cell.trim().is_empty()) {
            skipped += 1;
            continue;
        }

        let mut row = CsvRow::new();
        for (i, header) in raw_headers.iter().enumerate() {
            let header = header.trim();
            if header.is_empty() {
                continue;
            }
            if let Some(value) = record.get(i) {
                row.insert(header.to_string(), value.to_string());
            }
        }
        rows.push(row);
    }

    if skipped > 0 {
        debug!("Excluded {} blank or malformed lines", skipped);
    }

    if rows.is_empty() {
        return Err(Error::Import("CSV file contains no data rows".into()));
    }

    Ok(ParsedCsv { headers, rows })
}

/// Which transaction field a CSV column supplies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    PostedDate,
    Description,
    Amount,
    Category,
}

/// Classify a single header name against the known synonym sets
///
/// Debit/credit-style amount columns are handled separately in
/// [`detect_columns`] so that a plain "Amount" column wins over them.
pub fn classify_header(header: &str) -> Option<HeaderField> {
    let h = header.trim().to_lowercase();
    match h.as_str() {
        "date" | "posted date" | "post date" | "posting date" | "transaction date"
        | "trans. date" | "trans date" => Some(HeaderField::PostedDate),
        "description" | "memo" | "payee" | "merchant" | "details" | "name"
        | "transaction description" | "original description" => Some(HeaderField::Description),
        "amount" | "transaction amount" => Some(HeaderField::Amount),
        "category" | "transaction category" => Some(HeaderField::Category),
        _ => None,
    }
}

/// Confirmed column selection the orchestrator imports with
///
/// Date, description and amount are required; a category column is optional
/// enrichment. Detection output is only a suggestion — callers confirm (or
/// override) the mapping before importing.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub posted_date: String,
    pub description: String,
    pub amount: String,
    pub category: Option<String>,
}

/// Best-guess mapping produced by header detection; any field may be missing
#[derive(Debug, Clone, Default)]
pub struct MappingGuess {
    pub posted_date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
}

impl MappingGuess {
    /// Promote the guess to a usable mapping if all required fields were found
    pub fn confirm(self) -> Option<ColumnMapping> {
        Some(ColumnMapping {
            posted_date: self.posted_date?,
            description: self.description?,
            amount: self.amount?,
            category: self.category,
        })
    }
}

/// Guess which headers supply date, description, amount and category
///
/// Case-insensitive matching against known synonym sets; the first matching
/// header in file order wins each slot. A lone "Debit" or "Credit" column is
/// accepted for the amount only when no amount-named column exists.
pub fn detect_columns(headers: &[String]) -> MappingGuess {
    let mut guess = MappingGuess::default();

    for header in headers {
        match classify_header(header) {
            Some(HeaderField::PostedDate) => {
                guess.posted_date.get_or_insert_with(|| header.clone());
            }
            Some(HeaderField::Description) => {
                guess.description.get_or_insert_with(|| header.clone());
            }
            Some(HeaderField::Amount) => {
                guess.amount.get_or_insert_with(|| header.clone());
            }
            Some(HeaderField::Category) => {
                guess.category.get_or_insert_with(|| header.clone());
            }
            None => {}
        }
    }

    if guess.amount.is_none() {
        guess.amount = headers
            .iter()
            .find(|h| {
                let h = h.trim().to_lowercase();
                h == "debit" || h == "credit"
            })
            .cloned();
    }

    guess
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let csv = "Date,Description,Amount\n01/15/2024,NETFLIX.COM,-15.99\n01/14/2024,STARBUCKS,-5.50";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.headers, vec!["Date", "Description", "Amount"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("Description").unwrap(), "NETFLIX.COM");
        assert_eq!(parsed.rows[1].get("Amount").unwrap(), "-5.50");
    }

    #[test]
    fn test_parse_quoted_fields() {
        let csv = "Date,Description,Amount\n01/15/2024,\"ACME, INC\",-10.00\n01/16/2024,\"MULTI\nLINE PAYEE\",-20.00";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].get("Description").unwrap(), "ACME, INC");
        assert_eq!(
            parsed.rows[1].get("Description").unwrap(),
            "MULTI\nLINE PAYEE"
        );
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let csv = "Date,Description,Amount\n01/15/2024,COFFEE,-4.00\n,,\n01/16/2024,LUNCH,-12.00\n";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn test_parse_ragged_rows_tolerated() {
        let csv = "Date,Description,Amount\n01/15/2024,COFFEE\n01/16/2024,LUNCH,-12.00,extra";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        // Short row simply lacks the amount key
        assert!(parsed.rows[0].get("Amount").is_none());
    }

    #[test]
    fn test_parse_empty_file_is_error() {
        assert!(parse_csv("Date,Description,Amount\n").is_err());
        assert!(parse_csv("").is_err());
    }

    #[test]
    fn test_parse_dedupes_headers() {
        let csv = "Date,Amount,Amount\n01/15/2024,-1.00,-2.00";
        let parsed = parse_csv(csv).unwrap();
        assert_eq!(parsed.headers, vec!["Date", "Amount"]);
    }

    #[test]
    fn test_detect_standard_headers() {
        let headers: Vec<String> = ["Date", "Description", "Amount", "Category"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = detect_columns(&headers).confirm().unwrap();
        assert_eq!(mapping.posted_date, "Date");
        assert_eq!(mapping.description, "Description");
        assert_eq!(mapping.amount, "Amount");
        assert_eq!(mapping.category.as_deref(), Some("Category"));
    }

    #[test]
    fn test_detect_synonyms() {
        let headers: Vec<String> = ["Posted Date", "Payee", "Transaction Amount"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = detect_columns(&headers).confirm().unwrap();
        assert_eq!(mapping.posted_date, "Posted Date");
        assert_eq!(mapping.description, "Payee");
        assert_eq!(mapping.amount, "Transaction Amount");
        assert!(mapping.category.is_none());
    }

    #[test]
    fn test_detect_prefers_amount_over_debit() {
        let headers: Vec<String> = ["Transaction Date", "Description", "Debit", "Amount"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = detect_columns(&headers).confirm().unwrap();
        assert_eq!(mapping.amount, "Amount");
    }

    #[test]
    fn test_detect_falls_back_to_debit_column() {
        let headers: Vec<String> = ["Date", "Description", "Debit"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mapping = detect_columns(&headers).confirm().unwrap();
        assert_eq!(mapping.amount, "Debit");
    }

    #[test]
    fn test_detect_incomplete_headers() {
        let headers: Vec<String> = ["Some", "Random", "Headers"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(detect_columns(&headers).confirm().is_none());
    }
}
