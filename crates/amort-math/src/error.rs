//! Error types for numerical routines.

use thiserror::Error;

/// A specialized Result type for numerical routines.
pub type MathResult<T> = Result<T, MathError>;

/// Errors raised by the root finders.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// The iteration budget ran out, or the bracket collapsed, before the
    /// residual met the tolerance.
    #[error(
        "Convergence failed after {iterations} iterations \
         (last estimate: {last_estimate}, residual: {residual:.2e})"
    )]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Best abscissa found.
        last_estimate: f64,
        /// Function value at the best abscissa.
        residual: f64,
    },

    /// The supplied interval does not bracket a root.
    #[error("Invalid bracket: f({a}) = {fa:.2e} and f({b}) = {fb:.2e} have same sign")]
    InvalidBracket {
        /// Lower bound of bracket.
        a: f64,
        /// Upper bound of bracket.
        b: f64,
        /// Function value at a.
        fa: f64,
        /// Function value at b.
        fb: f64,
    },

    /// Expanding outward from the guess never produced a sign change.
    #[error("No sign change found around guess {guess} (searched [{lower}, {upper}])")]
    NoBracket {
        /// Starting point of the search.
        guess: f64,
        /// Lowest point evaluated.
        lower: f64,
        /// Highest point evaluated.
        upper: f64,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates a convergence failed error.
    #[must_use]
    pub fn convergence_failed(iterations: u32, last_estimate: f64, residual: f64) -> Self {
        Self::ConvergenceFailed {
            iterations,
            last_estimate,
            residual,
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::convergence_failed(100, 0.05, 1e-6);
        assert!(err.to_string().contains("100 iterations"));
        assert!(err.to_string().contains("0.05"));

        let err = MathError::NoBracket {
            guess: 0.0,
            lower: -1.0,
            upper: 1.0,
        };
        assert!(err.to_string().contains("guess 0"));
    }
}
