//! Interest rate with day-count and compounding conventions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Compounding, Date, Frequency};
use crate::daycounts::DayCountConvention;
use crate::error::{CoreError, CoreResult};

/// Growth and discount factors between two dates.
///
/// This is the seam through which the loan engine computes period interest:
/// interest on a notional `N` over `[d1, d2]` is `N * (compound_factor - 1)`.
pub trait RateConvention: Send + Sync {
    /// Multiplicative growth of one unit from `d1` to `d2`.
    fn compound_factor(&self, d1: Date, d2: Date) -> CoreResult<f64>;

    /// Present value at `d1` of one unit paid at `d2`.
    fn discount_factor(&self, d1: Date, d2: Date) -> CoreResult<f64> {
        Ok(1.0 / self.compound_factor(d1, d2)?)
    }
}

/// An annual rate bundled with its day count, compounding and frequency.
///
/// # Example
///
/// ```rust
/// use amort_core::prelude::*;
///
/// let rate = InterestRate::new(0.06, DayCountConvention::Thirty360US, Compounding::Compounded, Frequency::Annual);
/// let t0 = Date::from_ymd(2019, 10, 10).unwrap();
/// let t2 = Date::from_ymd(2021, 10, 10).unwrap();
/// assert!((rate.discount_factor(t0, t2).unwrap() - 1.0 / 1.06_f64.powi(2)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestRate {
    rate: f64,
    day_count: DayCountConvention,
    compounding: Compounding,
    frequency: Frequency,
}

impl InterestRate {
    /// Creates a new interest rate.
    #[must_use]
    pub fn new(
        rate: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Self {
        Self {
            rate,
            day_count,
            compounding,
            frequency,
        }
    }

    /// Same conventions, different rate level.
    #[must_use]
    pub fn with_rate(&self, rate: f64) -> Self {
        Self { rate, ..*self }
    }

    /// The annual rate as a decimal (0.06 = 6%).
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// The day count convention.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// The compounding convention.
    #[must_use]
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    /// The compounding frequency.
    #[must_use]
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Year fraction between two dates under this rate's day count.
    pub fn year_fraction(&self, d1: Date, d2: Date) -> CoreResult<f64> {
        self.day_count.year_fraction_f64(d1, d2)
    }

    /// Compound factor over `t` years.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRate` for negative `t` or when the rate
    /// drives the growth base to zero or below.
    pub fn compound_factor_time(&self, t: f64) -> CoreResult<f64> {
        if t < 0.0 {
            return Err(CoreError::invalid_rate(
                self.rate,
                format!("negative accrual time {t}"),
            ));
        }
        if t == 0.0 {
            return Ok(1.0);
        }

        let f = f64::from(self.frequency.periods_per_year());
        let factor = match self.compounding {
            Compounding::Simple => 1.0 + self.rate * t,
            Compounding::Compounded => self.periodic(f, t)?,
            Compounding::Continuous => (self.rate * t).exp(),
            Compounding::SimpleThenCompounded => {
                if t <= 1.0 / f {
                    1.0 + self.rate * t
                } else {
                    self.periodic(f, t)?
                }
            }
        };

        if factor <= 0.0 || !factor.is_finite() {
            return Err(CoreError::invalid_rate(
                self.rate,
                format!("compound factor {factor} over {t} years"),
            ));
        }
        Ok(factor)
    }

    fn periodic(&self, f: f64, t: f64) -> CoreResult<f64> {
        let base = 1.0 + self.rate / f;
        if base <= 0.0 {
            return Err(CoreError::invalid_rate(
                self.rate,
                format!("periodic base {base} is not positive"),
            ));
        }
        Ok(base.powf(f * t))
    }
}

impl RateConvention for InterestRate {
    fn compound_factor(&self, d1: Date, d2: Date) -> CoreResult<f64> {
        self.compound_factor_time(self.year_fraction(d1, d2)?)
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}% {} {} {}",
            self.rate * 100.0,
            self.day_count.name(),
            self.compounding,
            self.frequency
        )
    }
}
