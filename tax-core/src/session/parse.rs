use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Why a chat answer could not be read as the expected quantity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseInputError {
    #[error("no value given")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{0} is negative")]
    Negative(Decimal),

    #[error("{0} is not a whole number")]
    NotWhole(Decimal),

    #[error("{0} is too large")]
    TooLarge(Decimal),
}

/// Largest amount a chat answer may carry (one quadrillion).
///
/// Keeps every figure derived from an answer well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Trims whitespace and an optional `R$` currency marker.
fn normalize_input(s: &str) -> &str {
    let trimmed = s.trim();
    trimmed
        .strip_prefix("R$")
        .map(str::trim_start)
        .unwrap_or(trimmed)
}

/// Parses a non-negative amount such as `"85000"`, `"6000.50"` or `"R$ 120"`.
pub fn parse_non_negative_decimal(s: &str) -> Result<Decimal, ParseInputError> {
    let normalized = normalize_input(s);
    if normalized.is_empty() {
        return Err(ParseInputError::Empty);
    }

    let value: Decimal = normalized
        .parse()
        .map_err(|_| ParseInputError::NotANumber(normalized.to_string()))?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(ParseInputError::Negative(value));
    }
    if value > MAX_AMOUNT {
        return Err(ParseInputError::TooLarge(value));
    }
    Ok(value.abs())
}

/// Parses a non-negative whole count such as a number of dependents.
///
/// `"2"` and `"2.0"` are accepted; `"2.5"` is not.
pub fn parse_non_negative_integer(s: &str) -> Result<u32, ParseInputError> {
    let value = parse_non_negative_decimal(s)?;

    if !value.fract().is_zero() {
        return Err(ParseInputError::NotWhole(value));
    }
    value.to_u32().ok_or(ParseInputError::TooLarge(value))
}
