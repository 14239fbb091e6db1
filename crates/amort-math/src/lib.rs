//! # Amort Math
//!
//! Numerical routines for the Amort loan engine.
//!
//! - **Solvers**: Brent's method with automatic bracket search from an
//!   initial guess and step, behind the [`RootFinder`](solvers::RootFinder)
//!   trait
//!
//! ## Design Philosophy
//!
//! - **Residual Convergence**: a root is accepted when `|f(x)|` falls within
//!   the configured tolerance, so callers can rely on the objective being
//!   satisfied rather than on the bracket having shrunk
//! - **Best Effort Reporting**: failures carry the last estimate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::float_cmp)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::solvers::{brent, find_bracket, BrentSolver, RootFinder, SolverConfig, SolverResult};
}

pub use error::{MathError, MathResult};
