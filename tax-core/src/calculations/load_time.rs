//! How long a batch of pixels takes to load, at a fixed cooldown per pixel.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use crate::calculations::common::round_whole_half_up;
use crate::models::ElapsedTime;

/// Cooldown between two pixels.
pub const SECONDS_PER_PIXEL: u32 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadTimeError {
    #[error("pixel count {0} is negative")]
    Negative(Decimal),

    #[error("pixel count {0} is too large")]
    TooLarge(Decimal),
}

/// Converts a pixel count into hours and minutes.
///
/// Total time is rounded to the nearest minute (half-up) before being split,
/// so the minute part is always below 60.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::estimate_load_time;
///
/// let time = estimate_load_time(dec!(900)).unwrap();
///
/// assert_eq!(time.to_string(), "7h:30m");
/// ```
pub fn estimate_load_time(pixels: Decimal) -> Result<ElapsedTime, LoadTimeError> {
    if pixels < Decimal::ZERO {
        return Err(LoadTimeError::Negative(pixels));
    }

    let seconds = pixels
        .checked_mul(Decimal::from(SECONDS_PER_PIXEL))
        .ok_or(LoadTimeError::TooLarge(pixels))?;
    let total_minutes = round_whole_half_up(seconds / Decimal::from(60))
        .to_u64()
        .ok_or(LoadTimeError::TooLarge(pixels))?;

    Ok(ElapsedTime {
        hours: total_minutes / 60,
        // always < 60
        minutes: (total_minutes % 60) as u8,
    })
}
