//! Domain types for loan schedules.
//!
//! - [`Date`]: Calendar date
//! - [`Frequency`]: Payment and compounding frequency
//! - [`Compounding`]: Interest compounding convention
//! - [`InterestRate`]: Rate plus conventions, the [`RateConvention`] used by the engine

mod date;
mod frequency;
mod interest_rate;

pub use date::Date;
pub use frequency::{Compounding, Frequency};
pub use interest_rate::{InterestRate, RateConvention};
