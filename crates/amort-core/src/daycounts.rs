//! Day count conventions.
//!
//! Year fractions are computed exactly in `Decimal` and converted to `f64`
//! by the rate layer. Only the conventions a loan desk routinely quotes are
//! supported:
//!
//! - `Act360`: Actual/360, money market and floating legs
//! - `Act365Fixed`: Actual/365 Fixed
//! - `Thirty360US`: 30/360 US with February end-of-month rules
//! - `Thirty360E`: 30E/360 Eurobond
//!
//! ```rust
//! use amort_core::daycounts::DayCountConvention;
//! use amort_core::types::Date;
//! use rust_decimal::Decimal;
//!
//! let start = Date::from_ymd(2025, 1, 15).unwrap();
//! let end = Date::from_ymd(2025, 7, 15).unwrap();
//! assert_eq!(DayCountConvention::Thirty360US.day_count(start, end), 180);
//! assert_eq!(DayCountConvention::Thirty360US.year_fraction(start, end), Decimal::new(5, 1));
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::Date;

/// Supported day count conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCountConvention {
    /// Actual/360
    Act360,
    /// Actual/365 Fixed
    Act365Fixed,
    /// 30/360 US (Bond Basis)
    #[default]
    Thirty360US,
    /// 30E/360 (Eurobond Basis)
    Thirty360E,
}

impl DayCountConvention {
    /// Market name of the convention.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::Thirty360US => "30/360 US",
            DayCountConvention::Thirty360E => "30E/360",
        }
    }

    /// Number of days between `start` and `end` under this convention.
    #[must_use]
    pub fn day_count(&self, start: Date, end: Date) -> i64 {
        match self {
            DayCountConvention::Act360 | DayCountConvention::Act365Fixed => {
                start.days_between(&end)
            }
            DayCountConvention::Thirty360US => thirty360_us(start, end),
            DayCountConvention::Thirty360E => thirty360_e(start, end),
        }
    }

    /// Year fraction between `start` and `end`.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> Decimal {
        let basis = match self {
            DayCountConvention::Act365Fixed => 365,
            _ => 360,
        };
        Decimal::from(self.day_count(start, end)) / Decimal::from(basis)
    }

    /// Year fraction as `f64`, for the rate layer.
    pub fn year_fraction_f64(&self, start: Date, end: Date) -> CoreResult<f64> {
        self.year_fraction(start, end)
            .to_f64()
            .ok_or_else(|| CoreError::invalid_date(format!("year fraction {start} -> {end}")))
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn is_last_day_of_february(date: Date) -> bool {
    date.month() == 2 && date.is_end_of_month()
}

fn thirty360_days(start: Date, end: Date, d1: i64, d2: i64) -> i64 {
    let y1 = i64::from(start.year());
    let y2 = i64::from(end.year());
    let m1 = i64::from(start.month());
    let m2 = i64::from(end.month());
    360 * (y2 - y1) + 30 * (m2 - m1) + (d2 - d1)
}

fn thirty360_us(start: Date, end: Date) -> i64 {
    let mut d1 = i64::from(start.day());
    let mut d2 = i64::from(end.day());

    let start_feb_eom = is_last_day_of_february(start);
    if start_feb_eom || d1 == 31 {
        d1 = 30;
    }
    if (start_feb_eom && is_last_day_of_february(end)) || (d2 == 31 && d1 >= 30) {
        d2 = 30;
    }

    thirty360_days(start, end, d1, d2)
}

fn thirty360_e(start: Date, end: Date) -> i64 {
    let d1 = i64::from(start.day()).min(30);
    let d2 = i64::from(end.day()).min(30);
    thirty360_days(start, end, d1, d2)
}
