//! Closed-form numeric, currency and date coercions
//!
//! These run before any synthesis; a `None` means the heuristics gave up
//! and the caller may fall back to example-driven conversion.

use crate::synthesis::extractor::{cached_regex, parse_float_prefix, parse_int_prefix};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to read ambiguous `NN/NN/YYYY` dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateConvention {
    /// Month first
    #[default]
    Us,
    /// Day first
    Eu,
    /// Year first
    Iso,
}

impl DateConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateConvention::Us => "US",
            DateConvention::Eu => "EU",
            DateConvention::Iso => "ISO",
        }
    }

    pub fn all() -> &'static [DateConvention] {
        &[DateConvention::Us, DateConvention::Eu, DateConvention::Iso]
    }
}

impl FromStr for DateConvention {
    type Err = super::RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "us" | "mdy" => Ok(DateConvention::Us),
            "eu" | "dmy" | "uk" => Ok(DateConvention::Eu),
            "iso" | "ymd" => Ok(DateConvention::Iso),
            _ => Err(super::RuntimeError::UnknownDateFormat(s.to_string())),
        }
    }
}

impl fmt::Display for DateConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which separator a grouped number most likely uses for decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decimal {
    Dot,
    Comma,
}

const CURRENCY_SYMBOLS: &[(char, Decimal)] = &[
    ('$', Decimal::Dot),
    ('£', Decimal::Dot),
    ('¥', Decimal::Dot),
    ('€', Decimal::Comma),
];

const CURRENCY_CODES: &[(&str, Decimal)] = &[
    ("USD", Decimal::Dot),
    ("GBP", Decimal::Dot),
    ("JPY", Decimal::Dot),
    ("CAD", Decimal::Dot),
    ("AUD", Decimal::Dot),
    ("EUR", Decimal::Comma),
    ("CHF", Decimal::Dot),
];

/// JavaScript-style `parseFloat` that also tolerates digit grouping commas.
pub fn parse_float(s: &str) -> Option<f64> {
    parse_float_prefix(&strip_grouping_commas(s))
}

/// JavaScript-style `parseInt` that also tolerates digit grouping commas.
pub fn parse_int(s: &str) -> Option<f64> {
    parse_int_prefix(&strip_grouping_commas(s))
}

/// Drop commas only inside runs grouped in threes, like `12,345,678`.
fn strip_grouping_commas(s: &str) -> String {
    let (Some(run), Some(grouped)) = (cached_regex(r"\d+(?:,\d+)+"), cached_regex(r"^\d{1,3}(?:,\d{3})+$"))
    else {
        return s.to_string();
    };
    run.replace_all(s, |caps: &regex::Captures| {
        let token = &caps[0];
        if grouped.is_match(token) {
            token.replace(',', "")
        } else {
            token.to_string()
        }
    })
    .into_owned()
}

/// Split a leading/trailing sign: `-12`, `(12)` and `12-` are negative.
fn strip_sign(s: &str) -> (bool, &str) {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return (true, inner.trim());
    }
    if let Some(rest) = s.strip_prefix('-').or_else(|| s.strip_prefix('−')) {
        return (true, rest.trim());
    }
    if let Some(rest) = s.strip_prefix('+') {
        return (false, rest.trim());
    }
    if let Some(rest) = s.strip_suffix('-') {
        return (true, rest.trim());
    }
    (false, s)
}

/// Read a grouped decimal like `1,234.56`, `1.234,56`, `1 234` or `12,5`.
fn grouped(digits: &str, prefer: Decimal) -> Option<f64> {
    let digits: String = digits.chars().filter(|c| !matches!(*c, ' ' | '\u{a0}' | '\'' | '_')).collect();
    let valid = cached_regex(r"^(?:\d+(?:[.,]\d+)*|[.,]\d+)$")?;
    if !valid.is_match(&digits) {
        return None;
    }
    let last_dot = digits.rfind('.');
    let last_comma = digits.rfind(',');
    let decimal = match (last_dot, last_comma) {
        (None, None) => return digits.parse().ok(),
        (Some(d), Some(c)) => {
            if d > c {
                Decimal::Dot
            } else {
                Decimal::Comma
            }
        }
        (Some(_), None) => separator_role(&digits, '.', prefer, Decimal::Dot),
        (None, Some(_)) => separator_role(&digits, ',', prefer, Decimal::Comma),
    };
    let (group, point) = match decimal {
        Decimal::Dot => (',', '.'),
        Decimal::Comma => ('.', ','),
    };
    // Grouping separators never follow the decimal point.
    if let Some(p) = digits.rfind(point)
        && digits[p..].contains(group)
    {
        return None;
    }
    if digits.matches(point).count() > 1 {
        return None;
    }
    let normalized: String = digits
        .chars()
        .filter(|c| *c != group)
        .map(|c| if c == point { '.' } else { c })
        .collect();
    normalized.parse().ok()
}

/// Decide whether the only separator kind present is a decimal point
/// (returns `as_decimal`) or digit grouping.
fn separator_role(digits: &str, sep: char, prefer: Decimal, as_decimal: Decimal) -> Decimal {
    let grouping = if as_decimal == Decimal::Dot { Decimal::Comma } else { Decimal::Dot };
    let parts: Vec<&str> = digits.split(sep).collect();
    let groups_of_three = parts.len() > 1
        && (1..=3).contains(&parts[0].len())
        && parts[1..].iter().all(|p| p.len() == 3);
    if parts.len() > 2 {
        return if groups_of_three { grouping } else { as_decimal };
    }
    if groups_of_three && prefer == grouping {
        grouping
    } else {
        as_decimal
    }
}

/// Closed-form number reading: grouping, percent and scientific notation.
/// Percentages are returned as fractions (`12.5%` → 0.125).
pub fn parse_number(s: &str) -> Option<f64> {
    let (negative, body) = strip_sign(s);
    let (percent, body) = match body.strip_suffix('%') {
        Some(rest) => (true, rest.trim_end()),
        None => (false, body),
    };
    let magnitude = if cached_regex(r"^\d+(?:\.\d+)?[eE][+-]?\d+$")?.is_match(body) {
        body.parse::<f64>().ok()?
    } else {
        grouped(body, Decimal::Dot)?
    };
    let value = if percent { magnitude / 100.0 } else { magnitude };
    Some(if negative { -value } else { value })
}

/// Closed-form currency reading: symbol or ISO code plus US or EU grouping.
pub fn parse_currency(s: &str) -> Option<f64> {
    let (negative, body) = strip_sign(s);
    let mut prefer = Decimal::Dot;
    let mut rest = body.to_string();

    if let Some(&(symbol, convention)) = CURRENCY_SYMBOLS.iter().find(|(c, _)| body.contains(*c)) {
        prefer = convention;
        rest = rest.replace(symbol, "");
    } else if let Some(&(code, convention)) = CURRENCY_CODES
        .iter()
        .find(|(code, _)| body.to_ascii_uppercase().contains(code))
    {
        prefer = convention;
        let upper = rest.to_ascii_uppercase();
        if let Some(at) = upper.find(code) {
            rest.replace_range(at..at + code.len(), "");
        }
    }

    // A sign may sit between the symbol and the digits: `$-12`, `€ (5)`.
    let (inner_negative, digits) = strip_sign(&rest);
    let value = grouped(digits.trim(), prefer)?;
    Some(if negative ^ inner_negative { -value } else { value })
}

const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 0,
    }
}

fn iso(year: i32, month: u32, day: u32) -> Option<String> {
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return None;
    }
    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

/// Closed-form date reading to `YYYY-MM-DD`.
///
/// Dotted dates are always day first. Slashed or dashed dates are read by
/// `convention` unless one field exceeds 12, which settles the order.
pub fn parse_date(s: &str, convention: DateConvention) -> Option<String> {
    let s = s.trim();
    let num = |caps: &regex::Captures<'_>, i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    if let Some(caps) = cached_regex(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[T ].*)?$")?.captures(s) {
        let year = caps.get(1)?.as_str().parse().ok()?;
        return iso(year, num(&caps, 2)?, num(&caps, 3)?);
    }

    if let Some(caps) = cached_regex(r"^(\d{1,2})([/.-])(\d{1,2})[/.-](\d{4})$")?.captures(s) {
        let (a, b) = (num(&caps, 1)?, num(&caps, 3)?);
        let year = caps.get(4)?.as_str().parse().ok()?;
        let dotted = caps.get(2).is_some_and(|m| m.as_str() == ".");
        let day_first = if dotted || a > 12 {
            true
        } else if b > 12 {
            false
        } else {
            convention == DateConvention::Eu
        };
        return if day_first { iso(year, b, a) } else { iso(year, a, b) };
    }

    // Jan 15, 2024 / January 15th 2024
    if let Some(caps) = cached_regex(r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})$")?.captures(s) {
        let month = month_number(caps.get(1)?.as_str())?;
        let year = caps.get(3)?.as_str().parse().ok()?;
        return iso(year, month, num(&caps, 2)?);
    }

    // 15 January 2024 / 15th Jan, 2024
    if let Some(caps) = cached_regex(r"^(\d{1,2})(?:st|nd|rd|th)?\s+([A-Za-z]+)\.?,?\s+(\d{4})$")?.captures(s) {
        let month = month_number(caps.get(2)?.as_str())?;
        let year = caps.get(3)?.as_str().parse().ok()?;
        return iso(year, month, num(&caps, 1)?);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_tolerates_grouping() {
        assert_eq!(parse_float("1,000"), Some(1000.0));
        assert_eq!(parse_float("2,000,000.5 units"), Some(2_000_000.5));
        assert_eq!(parse_float("3.25"), Some(3.25));
        assert_eq!(parse_float("1,5"), Some(1.0));
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_int("12,345"), Some(12345.0));
    }

    #[test]
    fn test_stray_commas_are_not_grouping() {
        assert_eq!(parse_float("1,5 and 2,000"), Some(1.0));
        assert_eq!(parse_float("2,000 and 1,5"), Some(2000.0));
        assert_eq!(parse_int("7,50 then 3,000"), Some(7.0));
        assert_eq!(parse_float("1234,567"), Some(1234.0));
        assert_eq!(strip_grouping_commas("1,5 and 2,000"), "1,5 and 2000");
    }

    #[test]
    fn test_parse_currency_conventions() {
        assert_eq!(parse_currency("€1.234,56"), Some(1234.56));
        assert_eq!(parse_currency("$1,234.56"), Some(1234.56));
        assert_eq!(parse_currency("$1,234"), Some(1234.0));
        assert_eq!(parse_currency("€1.234"), Some(1234.0));
        assert_eq!(parse_currency("£12"), Some(12.0));
        assert_eq!(parse_currency("($50.00)"), Some(-50.0));
        assert_eq!(parse_currency("-$5"), Some(-5.0));
        assert_eq!(parse_currency("1 234,50 EUR"), Some(1234.5));
        assert_eq!(parse_currency("USD 99.99"), Some(99.99));
        assert_eq!(parse_currency("free"), None);
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_number("12.5%"), Some(0.125));
        assert_eq!(parse_number("1.5e3"), Some(1500.0));
        assert_eq!(parse_number("(42)"), Some(-42.0));
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn test_parse_date_forms() {
        let us = DateConvention::Us;
        assert_eq!(parse_date("2024-01-15", us).as_deref(), Some("2024-01-15"));
        assert_eq!(parse_date("01/15/2024", us).as_deref(), Some("2024-01-15"));
        assert_eq!(parse_date("15/01/2024", us).as_deref(), Some("2024-01-15"));
        assert_eq!(parse_date("15.01.2024", us).as_deref(), Some("2024-01-15"));
        assert_eq!(parse_date("02/03/2024", us).as_deref(), Some("2024-02-03"));
        assert_eq!(parse_date("02/03/2024", DateConvention::Eu).as_deref(), Some("2024-03-02"));
        assert_eq!(parse_date("Jan 15, 2024", us).as_deref(), Some("2024-01-15"));
        assert_eq!(parse_date("15 January 2024", us).as_deref(), Some("2024-01-15"));
        assert_eq!(parse_date("February 30, 2024", us), None);
        assert_eq!(parse_date("2024-02-29", us).as_deref(), Some("2024-02-29"));
        assert_eq!(parse_date("someday", us), None);
    }

    #[test]
    fn test_date_convention_from_str() {
        assert_eq!("EU".parse::<DateConvention>().unwrap(), DateConvention::Eu);
        assert!("martian".parse::<DateConvention>().is_err());
    }
}
