//! # Amort Core
//!
//! Market primitives consumed by the Amort loan engine.
//!
//! This crate provides the collaborators that the amortization engine relies on
//! but does not own:
//!
//! - **Types**: [`Date`], [`Frequency`], [`Compounding`]
//! - **Day Count Conventions**: exact year fractions in `Decimal`
//! - **Interest Rates**: [`InterestRate`], the rate convention used to compute
//!   compound and discount factors between two dates
//! - **Schedules**: strictly increasing payment-date sequences
//! - **Curves**: the [`DiscountCurve`] trait with flat and interpolated curves
//!
//! ## Design Philosophy
//!
//! - **Explicit Over Implicit**: no global evaluation date; every query
//!   receives the dates it needs
//! - **Read-Only Collaborators**: curves and rates are immutable and
//!   `Send + Sync`, so independent loans can be built in parallel
//!
//! ## Example
//!
//! ```rust
//! use amort_core::prelude::*;
//!
//! let rate = InterestRate::new(0.06, DayCountConvention::Thirty360US, Compounding::Compounded, Frequency::Annual);
//! let start = Date::from_ymd(2019, 10, 10).unwrap();
//! let end = Date::from_ymd(2020, 10, 10).unwrap();
//! assert!((rate.compound_factor(start, end).unwrap() - 1.06).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::similar_names)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]

pub mod curves;
pub mod daycounts;
pub mod error;
pub mod schedule;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::curves::{DiscountCurve, FlatForward, InterpolatedDiscountCurve};
    pub use crate::daycounts::DayCountConvention;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::schedule::Schedule;
    pub use crate::types::{Compounding, Date, Frequency, InterestRate, RateConvention};
}

// Re-export commonly used types at crate root
pub use curves::{DiscountCurve, FlatForward, InterpolatedDiscountCurve};
pub use daycounts::DayCountConvention;
pub use error::{CoreError, CoreResult};
pub use schedule::Schedule;
pub use types::{Compounding, Date, Frequency, InterestRate, RateConvention};
