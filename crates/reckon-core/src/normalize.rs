//! Amount and date normalization for imported rows

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Parse an amount string into a signed value
///
/// Handles currency symbols, thousands separators, and accounting-style
/// parenthesized negatives ("(45.00)" -> -45.00). Non-numeric input is an
/// error, never zero.
pub fn parse_amount(s: &str) -> Result<f64> {
    let trimmed = s.trim();
    let parenthesized = trimmed.starts_with('(') && trimmed.ends_with(')');

    let cleaned: String = trimmed
        .chars()
        .filter(|&c| !matches!(c, '$' | '€' | '£' | ',' | ' ' | '(' | ')' | '+'))
        .collect();

    let value: f64 = cleaned
        .parse()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))?;

    if !value.is_finite() {
        return Err(Error::Import(format!("Non-finite amount: {}", s)));
    }

    Ok(if parenthesized { -value.abs() } else { value })
}

/// Day/month ordering for slash- or dash-separated dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    MonthFirst,
    DayFirst,
}

/// Date parser with per-file disambiguation
///
/// ISO dates parse directly. For "a/b/year" shapes, the first date that is
/// only valid in one ordering locks that ordering for the rest of the file;
/// until then ambiguous dates fall back to month-first, the dominant
/// convention in US bank exports.
#[derive(Debug, Default)]
pub struct DateParser {
    order: Option<DateOrder>,
}

impl DateParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordering locked so far, if any
    pub fn order(&self) -> Option<DateOrder> {
        self.order
    }

    /// Parse a date string, normalizing to a calendar date
    pub fn parse(&mut self, s: &str) -> Result<NaiveDate> {
        let s = s.trim();

        // Year-first forms are unambiguous
        for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Ok(date);
            }
        }

        let (a, b, year) = split_numeric_date(s)
            .ok_or_else(|| Error::Import(format!("Unable to parse date: {}", s)))?;

        let order = if a > 12 && b <= 12 {
            self.order.get_or_insert(DateOrder::DayFirst);
            DateOrder::DayFirst
        } else if b > 12 && a <= 12 {
            self.order.get_or_insert(DateOrder::MonthFirst);
            DateOrder::MonthFirst
        } else {
            self.order.unwrap_or(DateOrder::MonthFirst)
        };

        let (month, day) = match order {
            DateOrder::MonthFirst => (a, b),
            DateOrder::DayFirst => (b, a),
        };

        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::Import(format!("Unable to parse date: {}", s)))
    }
}

/// Split "a/b/year" (or dash-separated) into its numeric parts
///
/// Two-digit years are taken as 2000-2099.
fn split_numeric_date(s: &str) -> Option<(u32, u32, i32)> {
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    if parts.len() != 3 {
        return None;
    }

    let a: u32 = parts[0].trim().parse().ok()?;
    let b: u32 = parts[1].trim().parse().ok()?;
    let year_part = parts[2].trim();
    let mut year: i32 = year_part.parse().ok()?;
    if year_part.len() == 2 {
        year += 2000;
    } else if year_part.len() != 4 {
        return None;
    }

    if a == 0 || b == 0 || a > 31 || b > 31 {
        return None;
    }

    Some((a, b, year))
}
