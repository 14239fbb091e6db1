//! Outward bracket search.

use crate::error::{MathError, MathResult};

/// Factor by which the bracket grows on each expansion.
const GROWTH_FACTOR: f64 = 1.6;

/// Maximum number of expansions before giving up.
const MAX_EXPANSIONS: u32 = 100;

/// Maximum number of retreats from a non-finite evaluation.
const MAX_RETREATS: u32 = 60;

/// An interval `[lower, upper]` with its function values.
///
/// The values have opposite signs, or one of them is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// Lower end.
    pub lower: f64,
    /// Function value at `lower`.
    pub f_lower: f64,
    /// Upper end.
    pub upper: f64,
    /// Function value at `upper`.
    pub f_upper: f64,
}

impl Bracket {
    /// Width of the interval.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Searches outward from `guess` for an interval containing a sign change.
///
/// Starts with `[guess, guess + step]` and repeatedly pushes out the end with
/// the smaller `|f|` by `1.6` times the current width. When `f` is not finite
/// at a candidate point (for example a rate below the compounding domain),
/// the candidate is pulled halfway back toward the last finite point.
///
/// # Errors
///
/// - `MathError::InvalidInput` if `step` is not positive and finite or `f`
///   is not finite at `guess`.
/// - `MathError::NoBracket` if no sign change is found.
pub fn find_bracket<F>(f: &F, guess: f64, step: f64) -> MathResult<Bracket>
where
    F: Fn(f64) -> f64,
{
    if !(step > 0.0 && step.is_finite()) {
        return Err(MathError::invalid_input(format!(
            "bracketing step must be positive, got {step}"
        )));
    }

    let mut a = guess;
    let mut fa = f(a);
    if !fa.is_finite() {
        return Err(MathError::invalid_input(format!(
            "function is not finite at guess {guess}"
        )));
    }
    let (mut b, mut fb) = finite_toward(f, a, guess + step).ok_or(MathError::NoBracket {
        guess,
        lower: a,
        upper: a,
    })?;

    for _ in 0..MAX_EXPANSIONS {
        if fa * fb <= 0.0 {
            return Ok(Bracket {
                lower: a,
                f_lower: fa,
                upper: b,
                f_upper: fb,
            });
        }

        if fa.abs() < fb.abs() {
            let candidate = a + GROWTH_FACTOR * (a - b);
            match finite_toward(f, a, candidate) {
                Some((x, fx)) if x != a => (a, fa) = (x, fx),
                _ => break,
            }
        } else {
            let candidate = b + GROWTH_FACTOR * (b - a);
            match finite_toward(f, b, candidate) {
                Some((x, fx)) if x != b => (b, fb) = (x, fx),
                _ => break,
            }
        }
    }

    Err(MathError::NoBracket {
        guess,
        lower: a,
        upper: b,
    })
}

/// Evaluates `f` at `candidate`, halving the distance from `anchor` until the
/// value is finite.
fn finite_toward<F>(f: &F, anchor: f64, mut candidate: f64) -> Option<(f64, f64)>
where
    F: Fn(f64) -> f64,
{
    for _ in 0..MAX_RETREATS {
        if !candidate.is_finite() {
            return None;
        }
        let value = f(candidate);
        if value.is_finite() {
            return Some((candidate, value));
        }
        candidate = anchor + 0.5 * (candidate - anchor);
    }
    None
}
