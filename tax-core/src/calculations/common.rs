//! Rounding and clamping helpers shared by the calculators.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to two decimal places, ties away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(10041.386)), dec!(10041.39));
/// assert_eq!(round_half_up(dec!(0.125)), dec!(0.13));
/// assert_eq!(round_half_up(dec!(-0.125)), dec!(-0.13));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to a whole number, ties away from zero.
pub fn round_whole_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative values to zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-0.01)), dec!(0));
/// assert_eq!(non_negative(dec!(12.50)), dec!(12.50));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}
