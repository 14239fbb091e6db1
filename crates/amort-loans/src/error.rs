//! Error types for loan construction.

use amort_core::CoreError;
use amort_math::MathError;
use thiserror::Error;

use crate::config::ValidationError;

/// A specialized Result type for loan operations.
pub type LoanResult<T> = Result<T, LoanError>;

/// Errors that can occur while building a loan.
///
/// Every failure is structural: a loan is either fully validated or not
/// built at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    /// Explicit amortization count differs from the number of periods.
    #[error("Size mismatch: {amortizations} amortizations for {periods} periods")]
    SizeMismatch {
        /// Number of amortization amounts supplied.
        amortizations: usize,
        /// Number of periods in the schedule.
        periods: usize,
    },

    /// The schedule has no periods.
    #[error("Empty schedule: at least one period is required")]
    EmptySchedule,

    /// Assembly produced no cash flows.
    #[error("Loan has no cash flows")]
    EmptyCashFlows,

    /// Cash flows are out of order or start on/before the issue date.
    #[error("Date ordering violation: {reason}")]
    DateOrderingViolation {
        /// Description of the violation.
        reason: String,
    },

    /// Principal repayments do not add up to the face amount.
    #[error("Principal mismatch: expected {expected}, repaid {actual}")]
    PrincipalMismatch {
        /// Face amount.
        expected: f64,
        /// Sum of principal payments.
        actual: f64,
    },

    /// Coupon solver exhausted its iteration budget.
    #[error("Coupon solver did not converge after {iterations} iterations (last estimate {last_estimate})")]
    RootNotFound {
        /// Number of iterations attempted.
        iterations: u32,
        /// Best coupon found before giving up.
        last_estimate: f64,
    },

    /// Coupon solver could not find a sign change around its guess.
    #[error("Coupon solver found no bracket around guess {guess}")]
    NoBracket {
        /// The initial guess.
        guess: f64,
    },

    /// Invalid numeric input.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// Required builder field not set.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Configuration failed validation.
    #[error("Invalid configuration: {}", format_validation(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// Error from dates, rates, schedules or curves.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LoanError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a date ordering error.
    #[must_use]
    pub fn date_ordering(reason: impl Into<String>) -> Self {
        Self::DateOrderingViolation {
            reason: reason.into(),
        }
    }
}

impl From<MathError> for LoanError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::ConvergenceFailed {
                iterations,
                last_estimate,
                ..
            } => Self::RootNotFound {
                iterations,
                last_estimate,
            },
            MathError::NoBracket { guess, .. } => Self::NoBracket { guess },
            other => Self::invalid_input(other.to_string()),
        }
    }
}
