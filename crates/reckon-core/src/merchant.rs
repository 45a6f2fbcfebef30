//! Merchant key derivation
//!
//! Reduces a raw transaction description to a coarse, stable merchant
//! identifier. The same real-world merchant shows up with different trailing
//! reference codes, store numbers and city/state suffixes across exports;
//! the key strips that noise so grouping, rule matching and bulk edits see
//! one merchant. Pure and idempotent: no state, and running it on an
//! already-derived key returns the key unchanged.

/// Payment-processor and wallet prefixes that precede the actual merchant
const PROCESSOR_PREFIXES: &[&str] = &[
    "SQ *",
    "SQ*",
    "TST* ",
    "TST*",
    "PAYPAL *",
    "PAYPAL*",
    "PP*",
    "PY *",
    "APLPAY ",
    "APPLE PAY ",
    "GOOGLE PAY ",
    "GPAY ",
    "AMZN MKTP ",
    "CKE*",
];

/// Tokens that describe the payment rather than the counterparty
const NOISE_TOKENS: &[&str] = &[
    "POS", "DEBIT", "CREDIT", "CARD", "PURCHASE", "PAYMENT", "ACH", "ONLINE", "WEB", "BILL",
    "RECURRING", "AUTOPAY", "AUTH", "PENDING", "TRANSFER", "XFER", "WITHDRAWAL", "CHECK", "ATM",
    "VISA", "TRX", "TXN", "STORE", "MKTPL", "MKTP", "MARKETPLACE", "MARK", "PLACE", "COM", "NET",
    "ORG", "WWW", "INC", "LLC", "CORP", "LTD",
];

/// Two-letter US state and district codes, for trailing location stripping
const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

/// Merchant keys keep at most this many leading tokens
const MAX_TOKENS: usize = 3;

/// Derive a stable merchant key from a transaction description
///
/// Over-stripping is worse than under-stripping: very short, numeric-only or
/// already-canonical descriptions pass through close to unchanged, and the
/// result is never empty for non-empty input.
pub fn merchant_key(description: &str) -> String {
    let mut upper = description.trim().to_uppercase();

    // Processor prefixes can stack (e.g. a wallet in front of a processor)
    loop {
        let mut stripped = false;
        for prefix in PROCESSOR_PREFIXES {
            if upper.len() > prefix.len() && upper.starts_with(prefix) {
                upper = upper[prefix.len()..].trim_start().to_string();
                stripped = true;
            }
        }
        if !stripped {
            break;
        }
    }

    let collapsed = collapse(&upper);

    let mut tokens: Vec<&str> = collapsed
        .split_whitespace()
        .filter(|t| !is_noise_token(t) && !is_reference_token(t))
        .collect();

    // A trailing state code is a location suffix; the token before it is
    // usually the city
    if tokens.len() >= 2 && tokens.last().is_some_and(|t| STATE_CODES.contains(t)) {
        tokens.pop();
        if tokens.len() >= 2 {
            tokens.pop();
        }
    }

    tokens.truncate(MAX_TOKENS);

    if !tokens.is_empty() {
        return tokens.join(" ");
    }

    // Everything was stripped: fall back toward the original rather than
    // emit an empty key
    if !collapsed.is_empty() {
        return collapsed;
    }
    upper
}

/// Uppercase alphanumerics (plus '&'), everything else collapsed to spaces
fn collapse(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_space = true;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || c == '&' {
            output.push(c);
            previous_space = false;
        } else if !previous_space {
            output.push(' ');
            previous_space = true;
        }
    }
    output.trim_end().to_string()
}

fn is_noise_token(token: &str) -> bool {
    NOISE_TOKENS.contains(&token)
}

/// Reference/transaction codes and store numbers: all digits, or mixed
/// alphanumerics carrying two or more digits ("TM0QZ6HK3", "ST1234")
fn is_reference_token(token: &str) -> bool {
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 2 || (digits > 0 && digits == token.len())
}
