//! Coupon discovery.
//!
//! Two ways of turning a curve into a coupon:
//!
//! - **Equal cash flow**: Brent search for the coupon whose equal-payment
//!   walk, at the curve's annuity payment, amortizes exactly the face amount
//! - **At the market**: closed-form coupon pricing a given notional schedule
//!   at par against the curve

use amort_core::{Compounding, DayCountConvention, DiscountCurve, Frequency, InterestRate, Schedule};
use amort_math::solvers::{BrentSolver, RootFinder};

use crate::analytics;
use crate::assembler::CashFlowAssembler;
use crate::config::{CouponSolverConfig, Validate};
use crate::equal_cash_flow::{log_negative_amortization, EqualCashFlowDecomposition, EqualCashFlowSolver};
use crate::error::{LoanError, LoanResult};
use crate::notional::NotionalSchedule;

/// A solved equal-cash-flow coupon and its canonical decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponSolution {
    /// The coupon found, in the requested conventions.
    pub coupon: InterestRate,
    /// Decomposition re-walked once at `coupon`.
    pub decomposition: EqualCashFlowDecomposition,
    /// Brent iterations used.
    pub iterations: u32,
    /// Objective value `F - Σ amortization` at `coupon`.
    pub residual: f64,
}

/// Finds coupons implied by a discount curve.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouponRootFinder {
    config: CouponSolverConfig,
}

impl CouponRootFinder {
    /// Creates a finder with the given solver settings.
    #[must_use]
    pub fn new(config: CouponSolverConfig) -> Self {
        Self { config }
    }

    /// The solver settings.
    #[must_use]
    pub fn config(&self) -> &CouponSolverConfig {
        &self.config
    }

    /// Equal payment implied by the curve: `F · D(t0) / Σ D(t_i)`.
    pub fn curve_target_cash_flow<C>(
        face_amount: f64,
        curve: &C,
        schedule: &Schedule,
    ) -> LoanResult<f64>
    where
        C: DiscountCurve + ?Sized,
    {
        let d0 = curve.discount(schedule.start_date())?;
        let mut df_sum = 0.0;
        for &date in schedule.payment_dates() {
            df_sum += curve.discount(date)?;
        }
        if !(df_sum > 0.0 && df_sum.is_finite()) {
            return Err(LoanError::invalid_input(format!(
                "sum of discount factors {df_sum} is not positive"
            )));
        }
        Ok(face_amount * d0 / df_sum)
    }

    /// Coupon for which the curve's equal payment retires exactly the face.
    ///
    /// Solves `f(c) = F - Σ amortization_i(c) = 0` with Brent's method from
    /// the configured guess and step. Trial walks are discarded; the
    /// returned decomposition is a single walk at the coupon found.
    pub fn equal_cash_flow_coupon<C>(
        &self,
        face_amount: f64,
        schedule: &Schedule,
        curve: &C,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> LoanResult<CouponSolution>
    where
        C: DiscountCurve + ?Sized,
    {
        self.config.ensure_valid()?;
        if !(face_amount > 0.0 && face_amount.is_finite()) {
            return Err(LoanError::invalid_input(format!(
                "face amount must be positive, got {face_amount}"
            )));
        }

        let target = Self::curve_target_cash_flow(face_amount, curve, schedule)?;
        let convention = InterestRate::new(0.0, day_count, compounding, frequency);

        // Rates outside the compounding domain evaluate to NaN, which the
        // bracket search steps back from.
        let objective = |coupon: f64| {
            EqualCashFlowSolver::walk(face_amount, target, &convention.with_rate(coupon), schedule)
                .map_or(f64::NAN, |d| face_amount - d.total_amortization())
        };

        let result = BrentSolver
            .find_root(
                objective,
                self.config.guess,
                self.config.step,
                &self.config.solver_config(),
            )
            .map_err(|err| {
                tracing::warn!(
                    error = %err,
                    face_amount,
                    periods = schedule.periods(),
                    "Equal cash-flow coupon search failed"
                );
                LoanError::from(err)
            })?;

        tracing::debug!(
            coupon = result.root,
            iterations = result.iterations,
            residual = result.residual,
            target_cash_flow = target,
            "Equal cash-flow coupon found"
        );

        let coupon = convention.with_rate(result.root);
        let decomposition = EqualCashFlowSolver::walk(face_amount, target, &coupon, schedule)?;
        log_negative_amortization(&decomposition);

        Ok(CouponSolution {
            coupon,
            decomposition,
            iterations: result.iterations,
            residual: result.residual,
        })
    }

    /// Coupon pricing `notionals` at par against `curve` at the start date.
    ///
    /// Builds the zero-coupon cash flows of the schedule with accrual periods
    /// under `day_count` and solves
    /// `(F · D(t0) - Σ principal_i · D(t_i)) / Σ N_i · τ_i · D(t_i)`.
    pub fn atm_coupon<C>(
        notionals: &NotionalSchedule,
        curve: &C,
        day_count: DayCountConvention,
    ) -> LoanResult<f64>
    where
        C: DiscountCurve + ?Sized,
    {
        let zero = InterestRate::new(0.0, day_count, Compounding::Simple, Frequency::Annual);
        let trial = CashFlowAssembler::assemble(notionals, &zero)?;
        let start = notionals.schedule().start_date();
        let rate = analytics::atm_rate(&trial, curve, start, notionals.initial())?;

        tracing::debug!(atm_rate = rate, face_amount = notionals.initial(), "ATM coupon computed");
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notional::NotionalScheduleBuilder;
    use amort_core::{Date, FlatForward, InterpolatedDiscountCurve, RateConvention};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn flat(r: f64) -> FlatForward {
        FlatForward::new(
            date(2019, 10, 10),
            InterestRate::new(
                r,
                DayCountConvention::Thirty360US,
                Compounding::Compounded,
                Frequency::Annual,
            ),
        )
    }

    fn annual(periods: usize) -> Schedule {
        Schedule::regular(date(2019, 10, 10), periods, Frequency::Annual).unwrap()
    }

    #[test]
    fn test_flat_curve_recovers_curve_rate() {
        let finder = CouponRootFinder::new(CouponSolverConfig::default().with_accuracy(1e-10));
        let solution = finder
            .equal_cash_flow_coupon(
                100.0,
                &annual(5),
                &flat(0.06),
                DayCountConvention::Thirty360US,
                Compounding::Compounded,
                Frequency::Annual,
            )
            .unwrap();

        assert_relative_eq!(solution.coupon.rate(), 0.06, epsilon = 1e-9);
        assert!(solution.residual.abs() <= 1e-10);
        assert!(solution.decomposition.residual().abs() <= 1e-10);
    }

    #[test]
    fn test_round_trip_within_accuracy() {
        let curve = InterpolatedDiscountCurve::new(
            date(2019, 10, 10),
            &[
                (date(2020, 10, 10), 0.97),
                (date(2022, 10, 10), 0.90),
                (date(2024, 10, 10), 0.80),
            ],
        )
        .unwrap();
        let schedule = Schedule::regular(date(2019, 10, 10), 10, Frequency::SemiAnnual).unwrap();
        let finder = CouponRootFinder::default();
        let solution = finder
            .equal_cash_flow_coupon(
                1_000.0,
                &schedule,
                &curve,
                DayCountConvention::Act360,
                Compounding::Compounded,
                Frequency::SemiAnnual,
            )
            .unwrap();

        let accuracy = finder.config().accuracy;
        let replay = EqualCashFlowSolver::walk(
            1_000.0,
            solution.decomposition.target_cash_flow,
            &solution.coupon,
            &schedule,
        )
        .unwrap();
        assert!((replay.total_amortization() - 1_000.0).abs() <= accuracy);

        let decomposed = EqualCashFlowSolver::decompose(1_000.0, &solution.coupon, &schedule).unwrap();
        assert!((decomposed.total_amortization() - 1_000.0).abs() <= accuracy);
        assert!(solution.coupon.rate() > 0.0);
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let finder = CouponRootFinder::new(
            CouponSolverConfig::default()
                .with_accuracy(1e-15)
                .with_max_iterations(1),
        );
        let err = finder
            .equal_cash_flow_coupon(
                100.0,
                &annual(10),
                &flat(0.05),
                DayCountConvention::Thirty360US,
                Compounding::Compounded,
                Frequency::Annual,
            )
            .unwrap_err();
        match err {
            LoanError::RootNotFound {
                iterations,
                last_estimate,
            } => {
                assert_eq!(iterations, 1);
                assert!(last_estimate.is_finite());
            }
            other => panic!("expected RootNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let finder = CouponRootFinder::new(CouponSolverConfig::default().with_accuracy(-1.0));
        let err = finder
            .equal_cash_flow_coupon(
                100.0,
                &annual(2),
                &flat(0.05),
                DayCountConvention::Thirty360US,
                Compounding::Compounded,
                Frequency::Annual,
            )
            .unwrap_err();
        assert!(matches!(err, LoanError::InvalidConfig(_)));
    }

    #[test]
    fn test_atm_coupon_on_flat_simple_curve() {
        // Annual periods on a flat annual curve: the par coupon is the curve rate
        let curve = flat(0.05);
        let ns = NotionalScheduleBuilder::equal_principal(100.0, &annual(4)).unwrap();
        let atm = CouponRootFinder::atm_coupon(&ns, &curve, DayCountConvention::Thirty360US).unwrap();
        assert_relative_eq!(atm, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_target_cash_flow() {
        let curve = flat(0.06);
        let target = CouponRootFinder::curve_target_cash_flow(100.0, &curve, &annual(2)).unwrap();
        let rate = curve.rate();
        let expected = 100.0
            / (rate.discount_factor(date(2019, 10, 10), date(2020, 10, 10)).unwrap()
                + rate.discount_factor(date(2019, 10, 10), date(2021, 10, 10)).unwrap());
        assert_relative_eq!(target, expected, epsilon = 1e-12);
    }
}
