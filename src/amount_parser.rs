//! # Amount Parser
//!
//! This module turns the free-text amount of an ingredient ("2 dl", "500g",
//! "1,5 msk") into a numeric value and a trailing unit text.
//!
//! Parsing happens in two stages:
//!
//! 1. [`parse_amount`] tokenizes a leading number (`.` or `,` as decimal separator)
//!    and keeps whatever follows as lower-cased unit text.
//! 2. [`classify_unit`] maps that unit text onto an aggregation family using the
//!    unit catalog.
//!
//! Neither stage fails: text without a leading number is reported as
//! [`ParsedAmount::Unparseable`] and unknown unit text as [`UnitClass::Unrecognized`].
//!
//! ## Usage
//!
//! ```rust
//! use matsedel::amount_parser::{classify_unit, parse_amount, ParsedAmount, UnitClass};
//!
//! let parsed = parse_amount(Some("1,5 dl"));
//! assert_eq!(parsed, ParsedAmount::Parsed { value: 1.5, unit_text: "dl".to_string() });
//! assert_eq!(classify_unit("dl"), UnitClass::Volume(100.0));
//! assert_eq!(parse_amount(Some("en nypa")), ParsedAmount::Unparseable);
//! ```

use crate::units::{lookup_unit, Conversion, COUNT_UNIT};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Leading number, optional whitespace, free-text remainder
static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+(?:[.,][0-9]+)?)\s*(.*)$").expect("Amount pattern should be valid")
});

/// Result of parsing an amount string
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAmount {
    /// A leading number followed by (possibly empty) unit text
    Parsed {
        /// Numeric value with the decimal comma already normalised
        value: f64,
        /// Remainder after the number, trimmed and lower-cased
        unit_text: String,
    },
    /// The ingredient carries no amount at all (e.g. "salt")
    Empty,
    /// Text that does not start with a number (e.g. "en nypa")
    Unparseable,
}

/// Aggregation family of a parsed unit text
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitClass {
    /// Volume or spoon measure; factor converts to milliliters
    Volume(f64),
    /// Weight; factor converts to grams
    Weight(f64),
    /// Pieces, including a bare number without unit
    Count,
    /// Unknown or non-summable unit text
    Unrecognized,
}

impl ParsedAmount {
    /// Check if the amount produced a number
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParsedAmount::Parsed { .. })
    }
}

/// Parse an amount string into a value and unit text
///
/// # Arguments
///
/// * `amount` - The raw amount of an ingredient, possibly missing
///
/// # Returns
///
/// - `ParsedAmount::Empty` for a missing or blank amount
/// - `ParsedAmount::Parsed` when the trimmed text starts with a number
/// - `ParsedAmount::Unparseable` otherwise
///
/// # Examples
///
/// ```rust
/// use matsedel::amount_parser::{parse_amount, ParsedAmount};
///
/// assert_eq!(parse_amount(None), ParsedAmount::Empty);
/// assert_eq!(
///     parse_amount(Some("500g")),
///     ParsedAmount::Parsed { value: 500.0, unit_text: "g".to_string() }
/// );
/// // Ranges only capture their first number
/// assert_eq!(
///     parse_amount(Some("2-3 st")),
///     ParsedAmount::Parsed { value: 2.0, unit_text: "-3 st".to_string() }
/// );
/// ```
pub fn parse_amount(amount: Option<&str>) -> ParsedAmount {
    let Some(text) = amount.map(str::trim).filter(|text| !text.is_empty()) else {
        return ParsedAmount::Empty;
    };

    let Some(captures) = AMOUNT_PATTERN.captures(text) else {
        trace!(amount = text, "Amount has no leading number");
        return ParsedAmount::Unparseable;
    };

    let number = captures[1].replace(',', ".");
    let Ok(value) = number.parse::<f64>() else {
        return ParsedAmount::Unparseable;
    };
    let unit_text = captures
        .get(2)
        .map(|m| m.as_str().trim().to_lowercase())
        .unwrap_or_default();

    ParsedAmount::Parsed { value, unit_text }
}

/// Classify unit text into its aggregation family
///
/// Volume and spoon measures reach milliliters, weights reach grams, and "st" or
/// an empty unit text count pieces. Everything else, including the textual
/// measures of the catalog, is unrecognized and must not be summed.
pub fn classify_unit(unit_text: &str) -> UnitClass {
    if unit_text.is_empty() || unit_text == COUNT_UNIT {
        return UnitClass::Count;
    }

    match lookup_unit(unit_text).map(|unit| unit.conversion()) {
        Some(Conversion::ToMilliliters(factor)) => UnitClass::Volume(factor),
        Some(Conversion::ToGrams(factor)) => UnitClass::Weight(factor),
        Some(Conversion::Identity) => UnitClass::Count,
        Some(Conversion::NotSummable) | None => UnitClass::Unrecognized,
    }
}
