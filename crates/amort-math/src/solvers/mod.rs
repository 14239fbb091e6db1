//! Root-finding algorithms.
//!
//! - [`brent`]: Brent's method on a caller-supplied bracket
//! - [`find_bracket`]: outward search for a sign change from a guess
//! - [`BrentSolver`]: the two combined behind [`RootFinder`]
//!
//! # Example
//!
//! ```rust
//! use amort_math::solvers::{BrentSolver, RootFinder, SolverConfig};
//!
//! // Annuity rate: 5 payments of 23.10 against 100 today
//! let pv = |r: f64| (1..=5).map(|t| 23.10 / (1.0 + r).powi(t)).sum::<f64>() - 100.0;
//!
//! let result = BrentSolver.find_root(pv, 0.0, 0.01, &SolverConfig::default()).unwrap();
//! assert!(pv(result.root).abs() < 1e-10);
//! assert!(result.root > 0.04 && result.root < 0.05);
//! ```

mod bracket;
mod brent;

pub use bracket::{find_bracket, Bracket};
pub use brent::brent;

use crate::error::MathResult;

/// Default tolerance on `|f(x)|`.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default maximum iterations for root-finding algorithms.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Configuration for root-finding algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Convergence tolerance on the absolute residual `|f(x)|`.
    pub tolerance: f64,
    /// Maximum number of iterations after bracketing.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of a root-finding operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// The root found.
    pub root: f64,
    /// Number of iterations used.
    pub iterations: u32,
    /// Function value at the root.
    pub residual: f64,
}

/// Trait for root finders that start from a guess.
pub trait RootFinder {
    /// Finds a root of `f`, searching outward from `guess` with an initial
    /// bracketing `step`.
    fn find_root<F>(
        &self,
        f: F,
        guess: f64,
        step: f64,
        config: &SolverConfig,
    ) -> MathResult<SolverResult>
    where
        F: Fn(f64) -> f64;

    /// Returns the name of the solver.
    fn name(&self) -> &'static str;
}

/// Brent's method with automatic bracketing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrentSolver;

impl RootFinder for BrentSolver {
    fn find_root<F>(
        &self,
        f: F,
        guess: f64,
        step: f64,
        config: &SolverConfig,
    ) -> MathResult<SolverResult>
    where
        F: Fn(f64) -> f64,
    {
        let bracket = find_bracket(&f, guess, step)?;
        brent::brent_bracketed(&f, bracket, config)
    }

    fn name(&self) -> &'static str {
        "Brent"
    }
}
