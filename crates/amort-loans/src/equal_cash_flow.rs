//! Equal total cash flow per period.
//!
//! A constant payment `K` is split each period into interest on the
//! declining balance and principal `K - interest`. With the annuity target
//! `K = F / Σ df(t0, t_i)` the balance runs off to zero at maturity.

use amort_core::{RateConvention, Schedule};

use crate::error::{LoanError, LoanResult};

/// Result of walking a target payment through a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualCashFlowDecomposition {
    /// Balance at each boundary, `n + 1` values; the last is the residue.
    pub notionals: Vec<f64>,
    /// Principal repaid per period, `n` values.
    pub amortizations: Vec<f64>,
    /// Constant interest-plus-principal payment.
    pub target_cash_flow: f64,
}

impl EqualCashFlowDecomposition {
    /// Sum of per-period amortizations.
    #[must_use]
    pub fn total_amortization(&self) -> f64 {
        self.amortizations.iter().sum()
    }

    /// Balance left after the last payment.
    #[must_use]
    pub fn residual(&self) -> f64 {
        self.notionals.last().copied().unwrap_or(0.0)
    }

    /// Periods (0-based) whose amortization is negative.
    pub fn negative_amortization_periods(&self) -> impl Iterator<Item = usize> + '_ {
        self.amortizations
            .iter()
            .enumerate()
            .filter(|(_, a)| **a < 0.0)
            .map(|(i, _)| i)
    }
}

/// Decomposes an equal periodic payment into interest and principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualCashFlowSolver;

impl EqualCashFlowSolver {
    /// Annuity payment `F / Σ_{i=1..n} df(t0, t_i)` under `rate`.
    pub fn target_cash_flow<R>(face_amount: f64, rate: &R, schedule: &Schedule) -> LoanResult<f64>
    where
        R: RateConvention + ?Sized,
    {
        let start = schedule.start_date();
        let mut annuity = 0.0;
        for &date in schedule.payment_dates() {
            annuity += rate.discount_factor(start, date)?;
        }
        if !(annuity > 0.0 && annuity.is_finite()) {
            return Err(LoanError::invalid_input(format!(
                "annuity factor {annuity} is not positive"
            )));
        }
        Ok(face_amount / annuity)
    }

    /// Walks `target` forward from `face_amount` without clamping.
    ///
    /// Negative amortizations (interest above the target) are kept as-is.
    pub fn walk<R>(
        face_amount: f64,
        target: f64,
        rate: &R,
        schedule: &Schedule,
    ) -> LoanResult<EqualCashFlowDecomposition>
    where
        R: RateConvention + ?Sized,
    {
        let periods = schedule.periods();
        if periods == 0 {
            return Err(LoanError::EmptySchedule);
        }

        let mut notionals = Vec::with_capacity(periods + 1);
        let mut amortizations = Vec::with_capacity(periods);
        let mut outstanding = face_amount;
        notionals.push(outstanding);

        for (start, end) in schedule.period_bounds() {
            let interest = outstanding * (rate.compound_factor(start, end)? - 1.0);
            let amortization = target - interest;
            outstanding -= amortization;
            amortizations.push(amortization);
            notionals.push(outstanding);
        }

        Ok(EqualCashFlowDecomposition {
            notionals,
            amortizations,
            target_cash_flow: target,
        })
    }

    /// Annuity target plus the walk, for a known coupon.
    pub fn decompose<R>(
        face_amount: f64,
        rate: &R,
        schedule: &Schedule,
    ) -> LoanResult<EqualCashFlowDecomposition>
    where
        R: RateConvention + ?Sized,
    {
        if !(face_amount > 0.0 && face_amount.is_finite()) {
            return Err(LoanError::invalid_input(format!(
                "face amount must be positive, got {face_amount}"
            )));
        }
        let target = Self::target_cash_flow(face_amount, rate, schedule)?;
        let decomposition = Self::walk(face_amount, target, rate, schedule)?;
        log_negative_amortization(&decomposition);
        Ok(decomposition)
    }
}

/// Reports front-loaded periods where interest exceeds the payment.
pub(crate) fn log_negative_amortization(decomposition: &EqualCashFlowDecomposition) {
    for period in decomposition.negative_amortization_periods() {
        tracing::warn!(
            period,
            amortization = decomposition.amortizations[period],
            target = decomposition.target_cash_flow,
            "Negative amortization: interest exceeds the equal cash flow"
        );
    }
}
