//! Loan assembly.
//!
//! [`LoanBuilder`] dispatches once on the amortization policy and the coupon
//! definition, then runs the build through private stages:
//! notionals computed, cash flows assembled, validated. A loan is either
//! fully validated or not built.

use std::fmt;

use serde::{Deserialize, Serialize};

use amort_core::{Compounding, Date, DayCountConvention, DiscountCurve, Frequency, InterestRate, Schedule};

use crate::analytics;
use crate::assembler::CashFlowAssembler;
use crate::cashflows::{self, CashFlowEvent};
use crate::config::{LoanConfig, Validate};
use crate::coupon_finder::CouponRootFinder;
use crate::equal_cash_flow::EqualCashFlowSolver;
use crate::error::{LoanError, LoanResult};
use crate::notional::{AmortizationPolicy, NotionalSchedule, NotionalScheduleBuilder, PolicyKind};

// ============================================================================
// Coupon definition
// ============================================================================

/// How the coupon of a fixed-rate loan is determined.
#[derive(Clone, Copy)]
pub enum CouponSpec<'c> {
    /// A known rate in its own conventions.
    Fixed(InterestRate),
    /// Implied by a discount curve, expressed in the given conventions.
    ///
    /// Equal cash-flow loans solve for the coupon whose equal payment
    /// retires the face; other policies take the at-the-market coupon.
    CurveImplied {
        /// Curve the coupon is implied from.
        curve: &'c dyn DiscountCurve,
        /// Coupon day count.
        day_count: DayCountConvention,
        /// Coupon compounding.
        compounding: Compounding,
        /// Coupon compounding frequency.
        frequency: Frequency,
    },
}

impl CouponSpec<'_> {
    /// A fixed coupon from a bare rate and its conventions.
    #[must_use]
    pub fn fixed(
        rate: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Self {
        Self::Fixed(InterestRate::new(rate, day_count, compounding, frequency))
    }
}

impl From<InterestRate> for CouponSpec<'_> {
    fn from(rate: InterestRate) -> Self {
        Self::Fixed(rate)
    }
}

impl fmt::Debug for CouponSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(rate) => f.debug_tuple("Fixed").field(rate).finish(),
            Self::CurveImplied {
                curve,
                day_count,
                compounding,
                frequency,
            } => f
                .debug_struct("CurveImplied")
                .field("curve_reference_date", &curve.reference_date())
                .field("day_count", day_count)
                .field("compounding", compounding)
                .field("frequency", frequency)
                .finish(),
        }
    }
}

/// Coupon a loan was built with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LoanCoupon {
    /// Fixed rate, either given or implied.
    Fixed(InterestRate),
    /// Forward rate projected from a curve plus a spread.
    Floating {
        /// Spread over the projected forward, simple annualized.
        spread: f64,
        /// Accrual day count.
        day_count: DayCountConvention,
    },
}

impl LoanCoupon {
    /// Day count used for accrual.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        match self {
            Self::Fixed(rate) => rate.day_count(),
            Self::Floating { day_count, .. } => *day_count,
        }
    }

    /// The fixed rate, if any.
    #[must_use]
    pub fn fixed_rate(&self) -> Option<&InterestRate> {
        match self {
            Self::Fixed(rate) => Some(rate),
            Self::Floating { .. } => None,
        }
    }

    /// The floating spread, if any.
    #[must_use]
    pub fn spread(&self) -> Option<f64> {
        match self {
            Self::Fixed(_) => None,
            Self::Floating { spread, .. } => Some(*spread),
        }
    }
}

impl fmt::Display for LoanCoupon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(rate) => write!(f, "{rate}"),
            Self::Floating { spread, day_count } => {
                write!(f, "forward + {:.2}bp {}", spread * 1e4, day_count.name())
            }
        }
    }
}

// ============================================================================
// Loan
// ============================================================================

/// A validated amortizing loan.
///
/// Cash flows are non-empty, ordered by date with interest before principal
/// on shared dates, and principal repayments sum to the face amount.
/// Deserialization runs the same checks as [`LoanBuilder::build`] under the
/// default [`LoanConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LoanRecord")]
pub struct Loan {
    face_amount: f64,
    issue_date: Date,
    cashflows: Vec<CashFlowEvent>,
    notional_schedule: NotionalSchedule,
    coupon: LoanCoupon,
    policy: PolicyKind,
}

impl Loan {
    /// Creates a new builder.
    #[must_use]
    pub fn builder<'c>() -> LoanBuilder<'c> {
        LoanBuilder::new()
    }

    /// Initial principal.
    #[must_use]
    pub fn face_amount(&self) -> f64 {
        self.face_amount
    }

    /// Date interest starts accruing.
    #[must_use]
    pub fn issue_date(&self) -> Date {
        self.issue_date
    }

    /// Last payment date.
    #[must_use]
    pub fn maturity_date(&self) -> Date {
        self.notional_schedule.schedule().end_date()
    }

    /// Ordered cash flows.
    #[must_use]
    pub fn cashflows(&self) -> &[CashFlowEvent] {
        &self.cashflows
    }

    /// Outstanding principal per schedule boundary.
    #[must_use]
    pub fn notional_schedule(&self) -> &NotionalSchedule {
        &self.notional_schedule
    }

    /// The coupon the cash flows were built with.
    #[must_use]
    pub fn coupon(&self) -> &LoanCoupon {
        &self.coupon
    }

    /// Amortization policy.
    #[must_use]
    pub fn policy(&self) -> PolicyKind {
        self.policy
    }

    /// Principal outstanding for the period containing `date`.
    #[must_use]
    pub fn notional_at(&self, date: Date) -> f64 {
        self.notional_schedule.notional_at(date)
    }

    /// Interest events.
    pub fn interest_cashflows(&self) -> impl Iterator<Item = &CashFlowEvent> {
        self.cashflows.iter().filter(|cf| cf.is_interest())
    }

    /// Principal events.
    pub fn principal_cashflows(&self) -> impl Iterator<Item = &CashFlowEvent> {
        self.cashflows.iter().filter(|cf| cf.is_principal())
    }

    /// Sum of interest paid.
    #[must_use]
    pub fn total_interest(&self) -> f64 {
        cashflows::total_interest(&self.cashflows)
    }

    /// Sum of principal repaid.
    #[must_use]
    pub fn total_principal(&self) -> f64 {
        cashflows::total_principal(&self.cashflows)
    }

    /// Weighted average life in years from the issue date, under the coupon
    /// day count.
    pub fn weighted_average_life(&self) -> LoanResult<f64> {
        analytics::weighted_average_life(&self.cashflows, self.issue_date, self.coupon.day_count())
    }

    /// Present value at `settlement`.
    pub fn npv<C>(&self, curve: &C, settlement: Date) -> LoanResult<f64>
    where
        C: DiscountCurve + ?Sized,
    {
        analytics::npv(&self.cashflows, curve, settlement)
    }
}

/// Unchecked serialized form of a [`Loan`].
#[derive(Deserialize)]
struct LoanRecord {
    face_amount: f64,
    issue_date: Date,
    cashflows: Vec<CashFlowEvent>,
    notional_schedule: NotionalSchedule,
    coupon: LoanCoupon,
    policy: PolicyKind,
}

impl TryFrom<LoanRecord> for Loan {
    type Error = LoanError;

    fn try_from(record: LoanRecord) -> LoanResult<Self> {
        let config = LoanConfig::default();
        let initial = record.notional_schedule.initial();
        if (initial - record.face_amount).abs() > config.principal_tolerance_for(record.face_amount) {
            return Err(LoanError::invalid_input(format!(
                "face amount {} differs from initial notional {initial}",
                record.face_amount
            )));
        }

        CashFlowsAssembled {
            face_amount: record.face_amount,
            notionals: record.notional_schedule,
            coupon: record.coupon,
            cashflows: record.cashflows,
        }
        .validate(record.issue_date, &config, record.policy)
    }
}

// ============================================================================
// Build stages
// ============================================================================

/// Notionals and the coupon are known.
struct NotionalsComputed {
    face_amount: f64,
    notionals: NotionalSchedule,
    coupon: InterestRate,
}

impl NotionalsComputed {
    fn assemble(self) -> LoanResult<CashFlowsAssembled> {
        let cashflows = CashFlowAssembler::assemble(&self.notionals, &self.coupon)?;

        tracing::debug!(
            events = cashflows.len(),
            coupon = self.coupon.rate(),
            face_amount = self.face_amount,
            "Cash flows assembled"
        );

        Ok(CashFlowsAssembled {
            face_amount: self.face_amount,
            notionals: self.notionals,
            coupon: LoanCoupon::Fixed(self.coupon),
            cashflows,
        })
    }
}

/// Cash flows exist but have not been checked.
pub(crate) struct CashFlowsAssembled {
    pub(crate) face_amount: f64,
    pub(crate) notionals: NotionalSchedule,
    pub(crate) coupon: LoanCoupon,
    pub(crate) cashflows: Vec<CashFlowEvent>,
}

impl CashFlowsAssembled {
    /// Checks the loan invariants and produces the loan.
    pub(crate) fn validate(
        self,
        issue_date: Date,
        config: &LoanConfig,
        policy: PolicyKind,
    ) -> LoanResult<Loan> {
        let reject = |err: LoanError| {
            tracing::warn!(error = %err, policy = %policy, "Loan validation failed");
            err
        };

        let first = self
            .cashflows
            .first()
            .ok_or_else(|| reject(LoanError::EmptyCashFlows))?;

        if first.date <= issue_date {
            return Err(reject(LoanError::date_ordering(format!(
                "first payment {} is not after issue date {}",
                first.date, issue_date
            ))));
        }

        for (i, pair) in self.cashflows.windows(2).enumerate() {
            if pair[0].schedule_order(&pair[1]).is_gt() {
                return Err(reject(LoanError::date_ordering(format!(
                    "event {} ({}) precedes event {} ({})",
                    i + 1,
                    pair[1],
                    i,
                    pair[0]
                ))));
            }
        }

        let repaid = cashflows::total_principal(&self.cashflows);
        if (repaid - self.face_amount).abs() > config.principal_tolerance_for(self.face_amount) {
            return Err(reject(LoanError::PrincipalMismatch {
                expected: self.face_amount,
                actual: repaid,
            }));
        }

        tracing::debug!(
            policy = %policy,
            face_amount = self.face_amount,
            events = self.cashflows.len(),
            maturity = %self.notionals.schedule().end_date(),
            "Loan validated"
        );

        Ok(Loan {
            face_amount: self.face_amount,
            issue_date,
            cashflows: self.cashflows,
            notional_schedule: self.notionals,
            coupon: self.coupon,
            policy,
        })
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for fixed-rate amortizing loans.
///
/// # Example
///
/// ```rust
/// use amort_core::{Compounding, Date, DayCountConvention, Frequency, Schedule};
/// use amort_loans::loan::LoanBuilder;
///
/// let schedule = Schedule::regular(
///     Date::from_ymd(2019, 10, 10).unwrap(),
///     2,
///     Frequency::Annual,
/// )
/// .unwrap();
///
/// let loan = LoanBuilder::new()
///     .face_amount(100.0)
///     .schedule(schedule)
///     .equal_principal()
///     .fixed_rate(0.06, DayCountConvention::Thirty360US, Compounding::Compounded, Frequency::Annual)
///     .build()
///     .unwrap();
///
/// assert_eq!(loan.notional_schedule().notionals(), &[100.0, 50.0, 0.0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoanBuilder<'c> {
    face_amount: Option<f64>,
    schedule: Option<Schedule>,
    policy: AmortizationPolicy,
    coupon: Option<CouponSpec<'c>>,
    issue_date: Option<Date>,
    config: LoanConfig,
}

impl<'c> LoanBuilder<'c> {
    /// Creates a builder with the equal-principal policy and default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the face amount.
    ///
    /// Required for equal-principal and equal cash-flow loans. For explicit
    /// loans it is optional and must match the sum of the amounts.
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

    /// Sets the amortization policy.
    #[must_use]
    pub fn policy(mut self, policy: AmortizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Equal principal every period.
    #[must_use]
    pub fn equal_principal(self) -> Self {
        self.policy(AmortizationPolicy::EqualPrincipal)
    }

    /// Equal total payment every period.
    #[must_use]
    pub fn equal_cash_flow(self) -> Self {
        self.policy(AmortizationPolicy::EqualCashFlow)
    }

    /// Explicit principal per period.
    #[must_use]
    pub fn explicit(self, amortizations: impl Into<Vec<f64>>) -> Self {
        self.policy(AmortizationPolicy::Explicit(amortizations.into()))
    }

    /// Sets how the coupon is determined.
    #[must_use]
    pub fn coupon(mut self, coupon: impl Into<CouponSpec<'c>>) -> Self {
        self.coupon = Some(coupon.into());
        self
    }

    /// Fixed coupon from a bare rate.
    #[must_use]
    pub fn fixed_rate(
        self,
        rate: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Self {
        self.coupon(CouponSpec::fixed(rate, day_count, compounding, frequency))
    }

    /// Coupon implied by `curve`.
    #[must_use]
    pub fn curve_implied(
        self,
        curve: &'c dyn DiscountCurve,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Self {
        self.coupon(CouponSpec::CurveImplied {
            curve,
            day_count,
            compounding,
            frequency,
        })
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
    /// Returns `MissingField` for an unset schedule, coupon or required face
    /// amount, `InvalidConfig` for a bad configuration, and the structural
    /// errors of each build stage.
    pub fn build(self) -> LoanResult<Loan> {
        self.config.ensure_valid()?;
        let schedule = self
            .schedule
            .clone()
            .ok_or_else(|| LoanError::missing_field("schedule"))?;
        let coupon = self
            .coupon
            .ok_or_else(|| LoanError::missing_field("coupon"))?;
        let issue_date = self.issue_date.unwrap_or_else(|| schedule.start_date());
        let policy = self.policy.kind();

        tracing::debug!(
            policy = %policy,
            periods = schedule.periods(),
            start = %schedule.start_date(),
            maturity = %schedule.end_date(),
            "Building loan"
        );

        self.compute_notionals(schedule, coupon)?
            .assemble()?
            .validate(issue_date, &self.config, policy)
    }

    fn compute_notionals(
        &self,
        schedule: Schedule,
        coupon: CouponSpec<'c>,
    ) -> LoanResult<NotionalsComputed> {
        match &self.policy {
            AmortizationPolicy::EqualCashFlow => self.equal_cash_flow_notionals(schedule, coupon),
            policy => {
                let notionals = NotionalScheduleBuilder::build(policy, self.face_amount, &schedule)?;
                let face_amount = notionals.initial();
                if let Some(stated) = self.face_amount {
                    if (stated - face_amount).abs() > self.config.principal_tolerance_for(stated) {
                        return Err(LoanError::invalid_input(format!(
                            "face amount {stated} differs from total amortization {face_amount}"
                        )));
                    }
                }

                let coupon = match coupon {
                    CouponSpec::Fixed(rate) => rate,
                    CouponSpec::CurveImplied {
                        curve,
                        day_count,
                        compounding,
                        frequency,
                    } => {
                        let atm = CouponRootFinder::atm_coupon(&notionals, curve, day_count)?;
                        InterestRate::new(atm, day_count, compounding, frequency)
                    }
                };

                Ok(NotionalsComputed {
                    face_amount,
                    notionals,
                    coupon,
                })
            }
        }
    }

    fn equal_cash_flow_notionals(
        &self,
        schedule: Schedule,
        coupon: CouponSpec<'c>,
    ) -> LoanResult<NotionalsComputed> {
        let face_amount = self
            .face_amount
            .ok_or_else(|| LoanError::missing_field("face_amount"))?;

        let (coupon, decomposition) = match coupon {
            CouponSpec::Fixed(rate) => {
                let decomposition = EqualCashFlowSolver::decompose(face_amount, &rate, &schedule)?;
                (rate, decomposition)
            }
            CouponSpec::CurveImplied {
                curve,
                day_count,
                compounding,
                frequency,
            } => {
                let solution = CouponRootFinder::new(self.config.solver).equal_cash_flow_coupon(
                    face_amount,
                    &schedule,
                    curve,
                    day_count,
                    compounding,
                    frequency,
                )?;
                (solution.coupon, solution.decomposition)
            }
        };

        let residue = decomposition.residual();
        if residue.abs() > self.config.principal_tolerance_for(face_amount) {
            tracing::warn!(
                residue,
                face_amount,
                compounding = %coupon.compounding(),
                "Equal cash-flow walk leaves a balance; the final redemption absorbs it"
            );
        }

        let mut notionals = decomposition.notionals;
        if let Some(last) = notionals.last_mut() {
            *last = 0.0;
        }

        Ok(NotionalsComputed {
            face_amount,
            notionals: NotionalSchedule::new(schedule, notionals)?,
            coupon,
        })
    }
}

/// Builds each loan in turn.
pub fn build_loans<'c>(builders: Vec<LoanBuilder<'c>>) -> Vec<LoanResult<Loan>> {
    builders.into_iter().map(LoanBuilder::build).collect()
}

/// Builds independent loans in parallel using rayon.
#[cfg(feature = "parallel")]
pub fn build_loans_parallel<'c>(builders: Vec<LoanBuilder<'c>>) -> Vec<LoanResult<Loan>> {
    use rayon::prelude::*;
    builders.into_par_iter().map(LoanBuilder::build).collect()
}
