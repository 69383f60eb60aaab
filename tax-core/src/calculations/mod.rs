//! Tax and time calculations used by the chat assistant.
//!
//! Everything in here is pure: no I/O, no shared state.

pub mod common;
pub mod income_tax;
pub mod load_time;

pub use income_tax::{DependentDeductions, IncomeTaxCalculator};
pub use load_time::{LoadTimeError, SECONDS_PER_PIXEL, estimate_load_time};
