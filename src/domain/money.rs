use std::fmt;

use serde::Deserialize;

/// Money is represented as integer cents to avoid floating-point precision
/// issues. Rs 100.00 = 10000 cents.
pub type Cents = i64;

/// Format cents as a two-decimal currency string.
/// Example: 10000 -> "100.00", 50 -> "0.50"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Cents as whole currency units, for JSON fields the API renders as numbers.
pub fn cents_to_units(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Parse a non-negative decimal string into cents. More than two decimal
/// places is rejected rather than truncated: a voucher amount with sub-cent
/// precision is a caller mistake, not something to round away.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    if input.is_empty() || input.starts_with('-') || input.starts_with('+') {
        return Err(ParseCentsError::InvalidFormat);
    }

    let (units_str, decimals_str) = match input.split_once('.') {
        None => (input, ""),
        Some((u, d)) => (u, d),
    };
    if units_str.is_empty() && decimals_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let decimal_cents: i64 = match decimals_str.len() {
        0 => 0,
        1 => {
            decimals_str
                .parse::<i64>()
                .map_err(|_| ParseCentsError::InvalidFormat)?
                * 10
        }
        2 => decimals_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
        _ => return Err(ParseCentsError::TooManyDecimals),
    };

    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::InvalidFormat)
}

/// A monetary amount as it arrives in a JSON request body: either a number
/// (`100`, `30.5`) or a decimal string (`"100.00"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn into_cents(self) -> Result<Cents, ParseCentsError> {
        match self {
            Amount::Number(n) => {
                if !n.is_finite() || n < 0.0 || n > 1e12 {
                    return Err(ParseCentsError::InvalidFormat);
                }
                let cents = (n * 100.0).round();
                // Reject sub-cent precision, same rule as the string form.
                if (cents - n * 100.0).abs() > 1e-6 {
                    return Err(ParseCentsError::TooManyDecimals);
                }
                Ok(cents as Cents)
            }
            Amount::Text(s) => parse_cents(&s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    TooManyDecimals,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::TooManyDecimals => {
                write!(f, "amounts support at most two decimal places")
            }
        }
    }
}

impl std::error::Error for ParseCentsError {}
