//! Loan construction settings.
//!
//! Both structs deserialize with defaults for missing fields and are checked
//! through [`Validate`] before any work is done.

use serde::{Deserialize, Serialize};
use std::fmt;

use amort_math::solvers::SolverConfig;

use crate::error::{LoanError, LoanResult};

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,
    /// Validation error message.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Trait for validatable configurations.
pub trait Validate {
    /// Returns every rule the configuration violates.
    fn validate(&self) -> Vec<ValidationError>;

    /// Returns `true` if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Converts violations into [`LoanError::InvalidConfig`].
    fn ensure_valid(&self) -> LoanResult<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoanError::InvalidConfig(errors))
        }
    }
}

/// Settings for the equal-cash-flow coupon search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouponSolverConfig {
    /// Tolerance on the residual principal `F - Σ amortization`.
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,

    /// Iteration budget for Brent's method.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Starting coupon for the bracket search.
    #[serde(default)]
    pub guess: f64,

    /// Initial bracket width.
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_accuracy() -> f64 {
    1e-4
}

fn default_max_iterations() -> u32 {
    10_000
}

fn default_step() -> f64 {
    0.01
}

impl Default for CouponSolverConfig {
    fn default() -> Self {
        Self {
            accuracy: default_accuracy(),
            max_iterations: default_max_iterations(),
            guess: 0.0,
            step: default_step(),
        }
    }
}

impl CouponSolverConfig {
    /// Sets the accuracy.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the starting coupon.
    #[must_use]
    pub fn with_guess(mut self, guess: f64) -> Self {
        self.guess = guess;
        self
    }

    /// The equivalent root-finder configuration.
    #[must_use]
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::new(self.accuracy, self.max_iterations)
    }
}

impl Validate for CouponSolverConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(self.accuracy > 0.0 && self.accuracy.is_finite()) {
            errors.push(ValidationError::new(
                "accuracy",
                format!("must be positive and finite, got {}", self.accuracy),
            ));
        }
        if self.max_iterations == 0 {
            errors.push(ValidationError::new("max_iterations", "must be at least 1"));
        }
        if !self.guess.is_finite() {
            errors.push(ValidationError::new("guess", "must be finite"));
        }
        if !(self.step > 0.0 && self.step.is_finite()) {
            errors.push(ValidationError::new(
                "step",
                format!("must be positive and finite, got {}", self.step),
            ));
        }

        errors
    }
}

/// Settings shared by every loan build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanConfig {
    /// Coupon search settings.
    #[serde(default)]
    pub solver: CouponSolverConfig,

    /// Allowed principal shortfall, relative to the face amount.
    #[serde(default = "default_principal_tolerance")]
    pub principal_tolerance: f64,
}

fn default_principal_tolerance() -> f64 {
    1e-6
}

impl Default for LoanConfig {
    fn default() -> Self {
        Self {
            solver: CouponSolverConfig::default(),
            principal_tolerance: default_principal_tolerance(),
        }
    }
}

impl LoanConfig {
    /// Absolute principal tolerance for a given face amount.
    #[must_use]
    pub fn principal_tolerance_for(&self, face_amount: f64) -> f64 {
        self.principal_tolerance * face_amount.abs().max(1.0)
    }
}

impl Validate for LoanConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.solver.validate();
        for error in &mut errors {
            error.field = format!("solver.{}", error.field);
        }

        if !(self.principal_tolerance >= 0.0 && self.principal_tolerance.is_finite()) {
            errors.push(ValidationError::new(
                "principal_tolerance",
                format!("must be non-negative, got {}", self.principal_tolerance),
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoanConfig::default();
        assert_eq!(config.solver.accuracy, 1e-4);
        assert_eq!(config.solver.max_iterations, 10_000);
        assert_eq!(config.solver.guess, 0.0);
        assert_eq!(config.solver.step, 0.01);
        assert_eq!(config.principal_tolerance, 1e-6);
        assert!(config.is_valid());
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"solver": {"accuracy": 1e-8}}"#;
        let config: LoanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.solver.accuracy, 1e-8);
        assert_eq!(config.solver.max_iterations, 10_000);
        assert_eq!(config.principal_tolerance, 1e-6);

        let config: LoanConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoanConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let config = LoanConfig {
            solver: CouponSolverConfig {
                accuracy: 0.0,
                max_iterations: 0,
                guess: 0.0,
                step: -0.01,
            },
            principal_tolerance: -1.0,
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0].field, "solver.accuracy");
        assert!(matches!(
            config.ensure_valid(),
            Err(LoanError::InvalidConfig(ref e)) if e.len() == 4
        ));
    }

    #[test]
    fn test_principal_tolerance_scales_with_face() {
        let config = LoanConfig::default();
        assert_eq!(config.principal_tolerance_for(1_000_000.0), 1.0);
        assert_eq!(config.principal_tolerance_for(0.5), 1e-6);
    }

    #[test]
    fn test_solver_config_conversion() {
        let solver = CouponSolverConfig::default().with_accuracy(1e-9).with_max_iterations(50);
        let config = solver.solver_config();
        assert_eq!(config.tolerance, 1e-9);
        assert_eq!(config.max_iterations, 50);
    }
}
