//! Floating-rate amortizing loans.
//!
//! Coupons are projected off a forecast curve: over `[t_i, t_{i+1}]` the
//! simple forward is `F_i = (D(t_i) / D(t_{i+1}) - 1) / τ_i` and the
//! coupon pays `N_i · (F_i + s) · τ_i`.

use amort_core::{Date, DayCountConvention, DiscountCurve, Schedule};

use crate::analytics::{self, BASIS_POINT};
use crate::assembler::{CashFlowAssembler, CouponAccrual, PeriodAccrual};
use crate::config::{LoanConfig, Validate};
use crate::error::{LoanError, LoanResult};
use crate::loan::{CashFlowsAssembled, Loan, LoanCoupon};
use crate::notional::{NotionalSchedule, NotionalScheduleBuilder, PolicyKind};

/// Forward rate from a curve plus a fixed spread.
#[derive(Debug, Clone, Copy)]
pub struct ForwardProjection<'c, C: ?Sized> {
    curve: &'c C,
    day_count: DayCountConvention,
    spread: f64,
}

impl<'c, C: DiscountCurve + ?Sized> ForwardProjection<'c, C> {
    /// Projects forwards off `curve`, accruing under `day_count`.
    #[must_use]
    pub fn new(curve: &'c C, day_count: DayCountConvention, spread: f64) -> Self {
        Self {
            curve,
            day_count,
            spread,
        }
    }

    /// Simple forward rate over `[start, end]`.
    pub fn forward_rate(&self, start: Date, end: Date) -> LoanResult<f64> {
        let tau = self.accrual_period(start, end)?;
        let df_start = self.curve.discount(start)?;
        let df_end = self.curve.discount(end)?;
        Ok((df_start / df_end - 1.0) / tau)
    }

    fn accrual_period(&self, start: Date, end: Date) -> LoanResult<f64> {
        let tau = self.day_count.year_fraction_f64(start, end)?;
        if tau <= 0.0 {
            return Err(LoanError::invalid_input(format!(
                "zero accrual period {start} -> {end} under {}",
                self.day_count
            )));
        }
        Ok(tau)
    }
}

impl<C: DiscountCurve + ?Sized> CouponAccrual for ForwardProjection<'_, C> {
    fn accrue(&self, start: Date, end: Date) -> LoanResult<PeriodAccrual> {
        let tau = self.accrual_period(start, end)?;
        let rate = self.forward_rate(start, end)? + self.spread;
        Ok(PeriodAccrual {
            rate,
            accrual_period: tau,
            interest_factor: rate * tau,
        })
    }
}

/// Spread over the projected forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatingSpread {
    /// A quoted spread.
    Fixed(f64),
    /// The spread that prices the loan at par on the discount curve.
    CurveImplied,
}

impl Default for FloatingSpread {
    fn default() -> Self {
        Self::Fixed(0.0)
    }
}

/// Builder for floating-rate loans with explicit amortizations.
#[derive(Clone, Default)]
pub struct FloatingRateLoanBuilder<'c> {
    amortizations: Option<Vec<f64>>,
    face_amount: Option<f64>,
    schedule: Option<Schedule>,
    forecast_curve: Option<&'c dyn DiscountCurve>,
    discount_curve: Option<&'c dyn DiscountCurve>,
    day_count: Option<DayCountConvention>,
    spread: FloatingSpread,
    issue_date: Option<Date>,
    config: LoanConfig,
}

impl<'c> FloatingRateLoanBuilder<'c> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Principal repaid per period; negative amounts are draw-downs.
    #[must_use]
    pub fn amortizations(mut self, amortizations: impl Into<Vec<f64>>) -> Self {
        self.amortizations = Some(amortizations.into());
        self
    }

    /// Optional face amount, checked against the total amortization.
    #[must_use]
    pub fn face_amount(mut self, face_amount: f64) -> Self {
        self.face_amount = Some(face_amount);
        self
    }

    /// Sets the payment schedule.
    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Curve the forwards are projected from.
    #[must_use]
    pub fn forecast_curve(mut self, curve: &'c dyn DiscountCurve) -> Self {
        self.forecast_curve = Some(curve);
        self
    }

    /// Curve the implied spread is priced on (default: the forecast curve).
    #[must_use]
    pub fn discount_curve(mut self, curve: &'c dyn DiscountCurve) -> Self {
        self.discount_curve = Some(curve);
        self
    }

    /// Accrual day count (default: ACT/360).
    #[must_use]
    pub fn day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = Some(day_count);
        self
    }

    /// Sets the spread.
    #[must_use]
    pub fn spread(mut self, spread: FloatingSpread) -> Self {
        self.spread = spread;
        self
    }

    /// Sets the issue date (default: schedule start).
    #[must_use]
    pub fn issue_date(mut self, issue_date: Date) -> Self {
        self.issue_date = Some(issue_date);
        self
    }

    /// Sets the build configuration.
    #[must_use]
    pub fn config(mut self, config: LoanConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the loan.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for an unset schedule, forecast curve or
    /// amortizations, plus the errors of the fixed-rate build stages.
    pub fn build(self) -> LoanResult<Loan> {
        self.config.ensure_valid()?;
        let schedule = self
            .schedule
            .ok_or_else(|| LoanError::missing_field("schedule"))?;
        let forecast = self
            .forecast_curve
            .ok_or_else(|| LoanError::missing_field("forecast_curve"))?;
        let amortizations = self
            .amortizations
            .ok_or_else(|| LoanError::missing_field("amortizations"))?;
        let discount = self.discount_curve.unwrap_or(forecast);
        let day_count = self.day_count.unwrap_or(DayCountConvention::Act360);
        let issue_date = self.issue_date.unwrap_or_else(|| schedule.start_date());

        let notionals = NotionalScheduleBuilder::explicit(&amortizations, &schedule)?;
        let face_amount = notionals.initial();
        if let Some(stated) = self.face_amount {
            if (stated - face_amount).abs() > self.config.principal_tolerance_for(stated) {
                return Err(LoanError::invalid_input(format!(
                    "face amount {stated} differs from total amortization {face_amount}"
                )));
            }
        }

        let spread = match self.spread {
            FloatingSpread::Fixed(spread) => spread,
            FloatingSpread::CurveImplied => {
                implied_spread(&notionals, forecast, discount, day_count)?
            }
        };

        let projection = ForwardProjection::new(forecast, day_count, spread);
        let cashflows = CashFlowAssembler::assemble(&notionals, &projection)?;

        tracing::debug!(
            spread,
            day_count = %day_count,
            events = cashflows.len(),
            "Floating cash flows assembled"
        );

        CashFlowsAssembled {
            face_amount,
            notionals,
            coupon: LoanCoupon::Floating { spread, day_count },
            cashflows,
        }
        .validate(issue_date, &self.config, PolicyKind::Explicit)
    }
}

/// Spread that prices the loan at par on `discount` at the start date.
///
/// `s = (F - NPV(s = 0)) / Σ N_i · τ_i · D(t_i)`, all discounted to the start.
pub fn implied_spread<F, D>(
    notionals: &NotionalSchedule,
    forecast: &F,
    discount: &D,
    day_count: DayCountConvention,
) -> LoanResult<f64>
where
    F: DiscountCurve + ?Sized,
    D: DiscountCurve + ?Sized,
{
    let flat = ForwardProjection::new(forecast, day_count, 0.0);
    let trial = CashFlowAssembler::assemble(notionals, &flat)?;
    let start = notionals.schedule().start_date();

    let npv = analytics::npv(&trial, discount, start)?;
    let annuity = analytics::bps(&trial, discount, start)? / BASIS_POINT;
    if annuity == 0.0 {
        return Err(LoanError::invalid_input("zero annuity for the spread solve"));
    }

    let spread = (notionals.initial() - npv) / annuity;
    tracing::debug!(spread, npv, "Implied floating spread");
    Ok(spread)
}
