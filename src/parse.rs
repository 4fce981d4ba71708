//! Tolerant parsing of money and share amounts as rendered on the site.

use crate::error::ExtractionError;
use crate::types::Price;

/// Parse a displayed dollar amount into cents.
///
/// Accepts `$1,234.56`, `-$12.30`, `($12.30)`, `+$0.5`, `1234`. More than two
/// decimals are rounded half-up to the cent. Anything else, including the
/// `$—` placeholder, is a `ParseError` naming `field`.
pub fn parse_money(text: &str, field: &str) -> Result<Price, ExtractionError> {
    let err = || ExtractionError::parse(field, text);
    let mut s = text.trim();

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    let s = s.trim_start().strip_prefix('$').unwrap_or(s).trim();

    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(err());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }

    let dollars: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| err())?
    };
    let mut digits = frac.bytes().map(|b| i64::from(b - b'0'));
    let tens = digits.next().unwrap_or(0);
    let ones = digits.next().unwrap_or(0);
    let round_up = digits.next().is_some_and(|d| d >= 5);

    let cents = dollars
        .checked_mul(100)
        .and_then(|c| c.checked_add(tens * 10 + ones + i64::from(round_up)))
        .ok_or_else(err)?;
    Ok(Price(if negative { -cents } else { cents }))
}

/// Parse a displayed share count (`1,234.567`). Must be finite and non-negative.
pub fn parse_quantity(text: &str, field: &str) -> Result<f64, ExtractionError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(q) if q.is_finite() && q >= 0.0 => Ok(q),
        _ => Err(ExtractionError::parse(field, text)),
    }
}

/// True for the em-dash placeholders the site shows for missing values.
pub fn is_placeholder(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t == "—" || t == "$—" || t == "--" || t == "N/A"
}
