//! Brent's root-finding algorithm.

use super::bracket::Bracket;
use crate::error::{MathError, MathResult};
use crate::solvers::{SolverConfig, SolverResult};

/// Brent's method on the interval `[a, b]`.
///
/// Combines bisection, secant steps and inverse quadratic interpolation.
/// Converges when `|f(x)| <= config.tolerance`. A bracket that shrinks to
/// machine resolution with the residual still above tolerance is reported as
/// a convergence failure.
///
/// Requires: `f(a) * f(b) <= 0`
///
/// # Example
///
/// ```rust
/// use amort_math::solvers::{brent, SolverConfig};
///
/// let f = |x: f64| x * x * x - x - 2.0;
///
/// let result = brent(f, 1.0, 2.0, &SolverConfig::default()).unwrap();
/// assert!(f(result.root).abs() < 1e-10);
/// ```
pub fn brent<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let bracket = Bracket {
        lower: a,
        f_lower: f(a),
        upper: b,
        f_upper: f(b),
    };
    brent_bracketed(&f, bracket, config)
}

/// Brent's method on a bracket whose end values are already known.
pub(crate) fn brent_bracketed<F>(
    f: &F,
    bracket: Bracket,
    config: &SolverConfig,
) -> MathResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let Bracket {
        lower: mut a,
        f_lower: mut fa,
        upper: mut b,
        f_upper: mut fb,
    } = bracket;

    if !(config.tolerance >= 0.0) || config.max_iterations == 0 {
        return Err(MathError::invalid_input(format!(
            "tolerance {} / max_iterations {}",
            config.tolerance, config.max_iterations
        )));
    }
    if !fa.is_finite() || !fb.is_finite() {
        return Err(MathError::invalid_input(format!(
            "non-finite bracket values f({a}) = {fa}, f({b}) = {fb}"
        )));
    }
    if fa == 0.0 {
        return Ok(SolverResult {
            root: a,
            iterations: 0,
            residual: 0.0,
        });
    }
    if fb == 0.0 {
        return Ok(SolverResult {
            root: b,
            iterations: 0,
            residual: 0.0,
        });
    }
    if fa * fb > 0.0 {
        return Err(MathError::InvalidBracket { a, b, fa, fb });
    }

    // b is the best estimate, c the contrapoint so that [b, c] brackets the root
    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    for iteration in 0..config.max_iterations {
        if (fb > 0.0) == (fc > 0.0) {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let resolution = 2.0 * f64::EPSILON * b.abs() + f64::MIN_POSITIVE;
        let half_width = 0.5 * (c - b);

        if fb.abs() <= config.tolerance {
            return Ok(SolverResult {
                root: b,
                iterations: iteration,
                residual: fb,
            });
        }
        if half_width.abs() <= resolution {
            // Sign change across a jump, not a root
            return Err(MathError::convergence_failed(iteration, b, fb));
        }

        if e.abs() >= resolution && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // Secant
                (2.0 * half_width * s, 1.0 - s)
            } else {
                // Inverse quadratic interpolation
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * half_width * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let max_interpolated = (3.0 * half_width * q - (resolution * q).abs()).min((e * q).abs());
            if 2.0 * p < max_interpolated {
                e = d;
                d = p / q;
            } else {
                d = half_width;
                e = d;
            }
        } else {
            d = half_width;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > resolution {
            d
        } else {
            resolution.copysign(half_width)
        };
        fb = f(b);
        if !fb.is_finite() {
            return Err(MathError::invalid_input(format!(
                "function is not finite at {b} inside the bracket"
            )));
        }
    }

    Err(MathError::convergence_failed(config.max_iterations, b, fb))
}
