//! # Amount Normalizer
//!
//! Lenient parsing of free-text numeric tokens into [`Money`] values.
//!
//! External sales exports arrive as pasted text with no locale contract:
//! the same column may hold `1,234.56`, `1.234,56`, `1234`, `RM 1,234.56`
//! or plain garbage. This module turns any of those into cents, degrading
//! to zero instead of erroring.
//!
//! ## Parsing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "RM 1.234,56"                                                          │
//! │       │  strip everything except digits , . -                           │
//! │       ▼                                                                 │
//! │  "1.234,56"                                                             │
//! │       │  both separators present → the later one is the decimal point   │
//! │       ▼                                                                 │
//! │  "1234.56"                                                              │
//! │       │  strict decimal parse into cents (round half up on 3rd digit)   │
//! │       ▼                                                                 │
//! │  Money::from_cents(123456)                                              │
//! │                                                                         │
//! │  Any failure anywhere → Money::zero()  (never an error)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This lenient policy is deliberate and distinct from hard validation
//! errors: a mangled numeric cell must not abort ingestion of an entire
//! pasted export.

use crate::money::Money;

/// Parses a free-text numeric token into cents.
///
/// ## Rules
/// - Every character except digits, comma, dot and minus is stripped.
/// - An empty result, or exactly `-`, `.` or `,`, yields zero.
/// - Both comma and dot present: whichever occurs last is the decimal
///   separator, the other is removed. `1,234.56` and `1.234,56` both
///   parse to 123456 cents.
/// - Comma only: decimal separator when it falls within the last three
///   characters (two-decimal amounts), otherwise a thousands separator.
/// - The canonical string is parsed as a signed decimal; fractional digits
///   beyond cents round half up.
///
/// ## Example
/// ```rust
/// use dayclose_core::amount::parse_amount;
/// use dayclose_core::money::Money;
///
/// assert_eq!(parse_amount("1,234.56"), Money::from_cents(123456));
/// assert_eq!(parse_amount("1.234,56"), Money::from_cents(123456));
/// assert_eq!(parse_amount("abc"), Money::zero());
/// ```
pub fn parse_amount(raw: &str) -> Money {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if filtered.is_empty() || filtered == "-" || filtered == "." || filtered == "," {
        return Money::zero();
    }

    let canonical = canonicalize_separators(&filtered);

    parse_decimal_cents(&canonical)
        .map(Money::from_cents)
        .unwrap_or_else(Money::zero)
}

/// Resolves comma/dot ambiguity into a canonical dot-decimal string.
fn canonicalize_separators(s: &str) -> String {
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');

    match (last_comma, last_dot) {
        (Some(comma), Some(dot)) => {
            if comma > dot {
                // European style: dots are thousands, final comma is decimal
                keep_last_comma_as_dot(&strip_char(s, '.'))
            } else {
                strip_char(s, ',')
            }
        }
        (Some(comma), None) => {
            // Heuristic for two-decimal amounts: a comma in the last three
            // characters is a decimal separator, anything earlier is grouping
            if s.len() - comma <= 3 {
                keep_last_comma_as_dot(s)
            } else {
                strip_char(s, ',')
            }
        }
        _ => s.to_string(),
    }
}

fn strip_char(s: &str, ch: char) -> String {
    s.chars().filter(|c| *c != ch).collect()
}

/// Drops every comma except the last, which becomes the decimal point.
fn keep_last_comma_as_dot(s: &str) -> String {
    let last = match s.rfind(',') {
        Some(i) => i,
        None => return s.to_string(),
    };
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == ',' {
            if i == last {
                out.push('.');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Strict parse of a canonical `-?digits(.digits)?` string into cents.
///
/// Returns `None` on any malformed input (stray minus, multiple dots,
/// non-digits, overflow); the caller degrades that to zero.
fn parse_decimal_cents(s: &str) -> Option<i64> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if body.contains('-') {
        return None;
    }

    let mut parts = body.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if frac_part.contains('.') {
        return None;
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let int_value: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    // Cents come from the first two fractional digits; the third rounds
    let mut frac_digits = frac_part.chars().map(|c| c as i64 - '0' as i64);
    let tens = frac_digits.next().unwrap_or(0);
    let ones = frac_digits.next().unwrap_or(0);
    let round = frac_digits.next().unwrap_or(0);

    let mut cents = int_value.checked_mul(100)?.checked_add(tens * 10 + ones)?;
    if round >= 5 {
        cents = cents.checked_add(1)?;
    }

    Some(if negative { -cents } else { cents })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_style() {
        assert_eq!(parse_amount("1,234.56"), Money::from_cents(123456));
        assert_eq!(parse_amount("12,345,678.90"), Money::from_cents(1234567890));
    }

    #[test]
    fn test_european_style() {
        assert_eq!(parse_amount("1.234,56"), Money::from_cents(123456));
        assert_eq!(parse_amount("1.234.567,89"), Money::from_cents(123456789));
    }

    #[test]
    fn test_garbage_degrades_to_zero() {
        assert_eq!(parse_amount("abc"), Money::zero());
        assert_eq!(parse_amount(""), Money::zero());
        assert_eq!(parse_amount("-"), Money::zero());
        assert_eq!(parse_amount("."), Money::zero());
        assert_eq!(parse_amount(","), Money::zero());
        assert_eq!(parse_amount("  "), Money::zero());
        assert_eq!(parse_amount("1.2.3"), Money::zero());
        assert_eq!(parse_amount("1-2"), Money::zero());
    }

    #[test]
    fn test_currency_noise_stripped() {
        assert_eq!(parse_amount("RM 1,234.56"), Money::from_cents(123456));
        assert_eq!(parse_amount("$ 99.90"), Money::from_cents(9990));
        assert_eq!(parse_amount(" 42 "), Money::from_cents(4200));
    }

    #[test]
    fn test_comma_only_heuristic() {
        // Comma in the last three characters → decimal separator
        assert_eq!(parse_amount("12,34"), Money::from_cents(1234));
        assert_eq!(parse_amount("12,5"), Money::from_cents(1250));
        // Earlier comma → thousands grouping
        assert_eq!(parse_amount("1,234"), Money::from_cents(123400));
        assert_eq!(parse_amount("1,234,567"), Money::from_cents(123456700));
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(parse_amount("-45.99"), Money::from_cents(-4599));
        assert_eq!(parse_amount("-1.234,56"), Money::from_cents(-123456));
    }

    #[test]
    fn test_fraction_rounding() {
        assert_eq!(parse_amount("100.004"), Money::from_cents(10000));
        assert_eq!(parse_amount("100.005"), Money::from_cents(10001));
        assert_eq!(parse_amount("0.5"), Money::from_cents(50));
        assert_eq!(parse_amount(".5"), Money::from_cents(50));
        assert_eq!(parse_amount("12."), Money::from_cents(1200));
    }
}
