//! Payment schedules.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Date, Frequency};

/// A strictly increasing sequence of period boundary dates.
///
/// The first date is the accrual start (issue date); each subsequent date
/// closes one period and is a payment date. A schedule therefore has
/// `len() - 1` periods and at least one of them.
///
/// No business-day adjustment is applied; callers wanting adjusted dates
/// pass them explicitly to [`Schedule::from_dates`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Date>", into = "Vec<Date>")]
pub struct Schedule {
    dates: Vec<Date>,
}

impl Schedule {
    /// Builds a schedule from explicit boundary dates.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidSchedule` if fewer than two dates are
    /// given or the dates are not strictly increasing.
    pub fn from_dates(dates: Vec<Date>) -> CoreResult<Self> {
        if dates.len() < 2 {
            return Err(CoreError::invalid_schedule(format!(
                "need a start date and at least one payment date, got {} date(s)",
                dates.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoreError::invalid_schedule(format!(
                "dates must be strictly increasing: {} is followed by {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { dates })
    }

    /// Rolls `periods` unadjusted periods forward from `start`.
    ///
    /// Each date is computed from `start` directly, so month-end clamping in
    /// one period does not drift into the next.
    pub fn regular(start: Date, periods: usize, frequency: Frequency) -> CoreResult<Self> {
        let step = frequency.months_per_period() as i32;
        let dates = (0..=periods)
            .map(|i| start.add_months(step * i as i32))
            .collect::<CoreResult<Vec<_>>>()?;
        Self::from_dates(dates)
    }

    /// Number of boundary dates (periods + 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false; a valid schedule holds at least two dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of accrual periods.
    #[must_use]
    pub fn periods(&self) -> usize {
        self.dates.len() - 1
    }

    /// The date at index `i`, if any.
    #[must_use]
    pub fn at(&self, i: usize) -> Option<Date> {
        self.dates.get(i).copied()
    }

    /// The accrual start date.
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.dates[0]
    }

    /// The final payment date.
    #[must_use]
    pub fn end_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// All boundary dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Payment dates (every date after the start).
    #[must_use]
    pub fn payment_dates(&self) -> &[Date] {
        &self.dates[1..]
    }

    /// Iterator over `(accrual_start, accrual_end)` pairs.
    pub fn period_bounds(&self) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.dates.windows(2).map(|w| (w[0], w[1]))
    }
}

impl TryFrom<Vec<Date>> for Schedule {
    type Error = CoreError;

    fn try_from(dates: Vec<Date>) -> CoreResult<Self> {
        Self::from_dates(dates)
    }
}

impl From<Schedule> for Vec<Date> {
    fn from(schedule: Schedule) -> Self {
        schedule.dates
    }
}
