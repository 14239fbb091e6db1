//! Error types for market primitives.

use thiserror::Error;

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by dates, rates, schedules and curves.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Error in date calculations or invalid date.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// Description of the date error.
        message: String,
    },

    /// Payment schedule is malformed.
    #[error("Invalid schedule: {reason}")]
    InvalidSchedule {
        /// Description of what's wrong with the dates.
        reason: String,
    },

    /// A rate cannot produce a valid compound factor.
    #[error("Invalid rate {rate}: {reason}")]
    InvalidRate {
        /// The offending rate.
        rate: f64,
        /// Reason for invalidity.
        reason: String,
    },

    /// A curve was queried outside its domain or built from bad data.
    #[error("Curve error: {reason}")]
    CurveError {
        /// Description of the failure.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid date error.
    #[must_use]
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }

    /// Creates an invalid schedule error.
    #[must_use]
    pub fn invalid_schedule(reason: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            reason: reason.into(),
        }
    }

    /// Creates an invalid rate error.
    #[must_use]
    pub fn invalid_rate(rate: f64, reason: impl Into<String>) -> Self {
        Self::InvalidRate {
            rate,
            reason: reason.into(),
        }
    }

    /// Creates a curve error.
    #[must_use]
    pub fn curve_error(reason: impl Into<String>) -> Self {
        Self::CurveError {
            reason: reason.into(),
        }
    }
}
