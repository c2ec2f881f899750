use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, prelude::ToPrimitive};

// Two-digit-year forms come first: `%Y` also accepts one or two digits.
const DATE_FORMATS: &[&str] = &[
    "%m-%d-%y",
    "%m/%d/%y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Exclusive bound on the magnitude of an amount. Larger values are row
/// defects: summing enough of them would overflow `Decimal`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£', '¥'];

/// Tokens spreadsheet exports use for an absent value.
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_ascii_lowercase();
    matches!(
        lowered.as_str(),
        "na" | "n/a" | "nan" | "nat" | "null" | "none" | "#n/a"
    ) || lowered.chars().all(|c| c == '-')
}

/// Parses a calendar date, discarding any time-of-day component.
///
/// Month-first is preferred for ambiguous slash and dash forms.
pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if is_placeholder(trimmed) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parses a currency amount such as `1,299.00`, `₹ 450` or `1.2e3`.
///
/// Amounts at or beyond [`MAX_AMOUNT`] in magnitude are treated as missing.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if is_placeholder(trimmed) {
        return None;
    }
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let body = body.trim_start_matches(CURRENCY_SYMBOLS).trim();
    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    let parsed = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;
    if parsed.abs() >= Decimal::from(MAX_AMOUNT) {
        return None;
    }
    Some(if negative { -parsed } else { parsed })
}

/// Parses a non-negative whole quantity; `2.0` is accepted, `2.5` and `-1` are not.
pub fn parse_quantity(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    if is_placeholder(trimmed) {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<u64>() {
        return Some(parsed);
    }
    let decimal = Decimal::from_str(trimmed).ok()?;
    if decimal.is_sign_negative() || !decimal.fract().is_zero() {
        return None;
    }
    decimal.to_u64()
}

/// Trims a categorical label, mapping blanks and placeholders to `None`.
pub fn parse_label(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if is_placeholder(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
