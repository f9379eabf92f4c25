//! Identifier normalisation: raw cell → canonical digit string.
//!
//! Spreadsheets store UPCs as numbers more often than as text, which costs
//! them their leading zeros and sometimes adds a trailing `.0`. Normalising
//! is therefore two steps:
//!
//! 1. [`sanitize`] — read the cell as a number and truncate it to an integer,
//!    or, if it is not numeric, keep only its decimal digits.
//! 2. [`pad`] — restore leading zeros up to the 12-digit UPC-A length.
//!
//! The 12-digit all-zero string is the "no usable value" sentinel and is
//! rejected. Identifiers longer than 13 digits pass through untouched; the
//! renderer is the component that rejects them.

use crate::pipeline::sheet::RawCell;
use serde::Serialize;
use std::fmt;

/// Length of a UPC-A identifier.
pub const UPC_A_LEN: usize = 12;
/// Length of an EAN-13 identifier.
pub const EAN_13_LEN: usize = 13;

const ZERO_SENTINEL: &str = "000000000000";

/// A digit-only identifier of at least 12 digits that is not the all-zero
/// sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalIdentifier(String);

impl CanonicalIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Why a cell did not yield an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The cell is missing or blank.
    Empty,
    /// Nothing numeric could be read from the cell.
    NoDigits,
    /// The value pads to the all-zero sentinel.
    AllZero,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvalidReason::Empty => "empty cell",
            InvalidReason::NoDigits => "no digits",
            InvalidReason::AllZero => "all zeros",
        })
    }
}

/// Outcome of normalising one cell. Invalid cells are expected and are
/// skipped by the orchestrator; they are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Valid(CanonicalIdentifier),
    Invalid(InvalidReason),
}

/// Normalise a raw cell into a canonical identifier.
pub fn normalize(raw: &RawCell) -> Normalized {
    let Some(digits) = sanitize(raw) else {
        return Normalized::Invalid(InvalidReason::Empty);
    };
    if digits.is_empty() {
        return Normalized::Invalid(InvalidReason::NoDigits);
    }
    let padded = pad(&digits);
    if padded == ZERO_SENTINEL {
        return Normalized::Invalid(InvalidReason::AllZero);
    }
    Normalized::Valid(CanonicalIdentifier(padded))
}

/// Reduce a cell to its decimal digit string.
///
/// Returns `None` for an empty cell. Numbers (and numeric text such as
/// `"614141000012.0"`) are truncated to an integer and rendered without sign;
/// any other text keeps only its ASCII digits, which may leave an empty string.
pub fn sanitize(raw: &RawCell) -> Option<String> {
    match raw {
        RawCell::Empty => None,
        RawCell::Integer(i) => Some(i.unsigned_abs().to_string()),
        RawCell::Number(n) if n.is_nan() => None,
        RawCell::Number(n) => Some(number_digits(*n).unwrap_or_default()),
        RawCell::Text(s) => Some(
            s.trim()
                .parse::<f64>()
                .ok()
                .and_then(number_digits)
                .unwrap_or_else(|| s.chars().filter(char::is_ascii_digit).collect()),
        ),
    }
}

/// Integer digits of a finite float, truncated toward zero.
fn number_digits(n: f64) -> Option<String> {
    n.is_finite().then(|| format!("{:.0}", n.trunc().abs()))
}

/// Left-pad a digit string with zeros.
///
/// Shorter than 12 → padded to 12. Exactly 12, or 13 and longer, is
/// returned unchanged. There is no integer length strictly between 12 and
/// 13, so nothing is ever padded to 13.
pub fn pad(digits: &str) -> String {
    if digits.len() < UPC_A_LEN {
        format!("{digits:0>width$}", width = UPC_A_LEN)
    } else {
        digits.to_string()
    }
}
