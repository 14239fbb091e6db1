//! Outstanding-principal schedules.

use std::fmt;

use serde::{Deserialize, Serialize};

use amort_core::{Date, Schedule};

use crate::error::{LoanError, LoanResult};

/// Outstanding principal at each schedule boundary.
///
/// `notionals[i]` is the balance over the period `(dates[i], dates[i+1]]`;
/// the last entry is the balance after maturity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NotionalRecord")]
pub struct NotionalSchedule {
    schedule: Schedule,
    notionals: Vec<f64>,
}

impl NotionalSchedule {
    /// Pairs a schedule with one notional per boundary date.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::InvalidInput` if the lengths differ or a value is
    /// not finite.
    pub fn new(schedule: Schedule, notionals: Vec<f64>) -> LoanResult<Self> {
        if notionals.len() != schedule.len() {
            return Err(LoanError::invalid_input(format!(
                "{} notionals for {} schedule dates",
                notionals.len(),
                schedule.len()
            )));
        }
        if let Some(bad) = notionals.iter().find(|n| !n.is_finite()) {
            return Err(LoanError::invalid_input(format!("notional {bad} is not finite")));
        }
        Ok(Self {
            schedule,
            notionals,
        })
    }

    /// The underlying schedule.
    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Boundary dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        self.schedule.dates()
    }

    /// Outstanding principal per boundary.
    #[must_use]
    pub fn notionals(&self) -> &[f64] {
        &self.notionals
    }

    /// Number of boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notionals.len()
    }

    /// Always false; a schedule has at least two boundaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notionals.is_empty()
    }

    /// Principal at the start date.
    #[must_use]
    pub fn initial(&self) -> f64 {
        self.notionals[0]
    }

    /// Principal after the last payment.
    #[must_use]
    pub fn last(&self) -> f64 {
        self.notionals[self.notionals.len() - 1]
    }

    /// Iterator over `(boundary date, notional)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates().iter().copied().zip(self.notionals.iter().copied())
    }

    /// Principal repaid on each payment date.
    #[must_use]
    pub fn amortizations(&self) -> Vec<f64> {
        self.notionals.windows(2).map(|w| w[0] - w[1]).collect()
    }

    /// Principal outstanding for the period containing `date`.
    ///
    /// A payment date belongs to the period it closes, so the balance
    /// reported on a payment date is the one before that payment. Dates on or
    /// before the start report the initial principal; dates after maturity
    /// report zero.
    #[must_use]
    pub fn notional_at(&self, date: Date) -> f64 {
        if date > self.schedule.end_date() {
            return 0.0;
        }
        let idx = self.schedule.payment_dates().partition_point(|d| *d < date);
        self.notionals[idx]
    }
}

#[derive(Deserialize)]
struct NotionalRecord {
    schedule: Schedule,
    notionals: Vec<f64>,
}

impl TryFrom<NotionalRecord> for NotionalSchedule {
    type Error = LoanError;

    fn try_from(record: NotionalRecord) -> LoanResult<Self> {
        Self::new(record.schedule, record.notionals)
    }
}

/// How principal is repaid over the life of a loan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AmortizationPolicy {
    /// Same principal every period.
    #[default]
    EqualPrincipal,
    /// Same interest-plus-principal payment every period.
    EqualCashFlow,
    /// Caller-supplied principal per period; negative amounts are draw-downs.
    Explicit(Vec<f64>),
}

impl AmortizationPolicy {
    /// The policy without its data.
    #[must_use]
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::EqualPrincipal => PolicyKind::EqualPrincipal,
            Self::EqualCashFlow => PolicyKind::EqualCashFlow,
            Self::Explicit(_) => PolicyKind::Explicit,
        }
    }
}

/// Policy tag recorded on a built loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Equal principal.
    EqualPrincipal,
    /// Equal cash flow.
    EqualCashFlow,
    /// Explicit amortizations.
    Explicit,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EqualPrincipal => "Equal Principal",
            Self::EqualCashFlow => "Equal Cash Flow",
            Self::Explicit => "Explicit",
        };
        write!(f, "{name}")
    }
}

/// Builds notional schedules for the equal-principal and explicit policies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotionalScheduleBuilder;

impl NotionalScheduleBuilder {
    /// Dispatches on `policy`.
    ///
    /// Equal principal needs `face_amount`; explicit amounts carry their own
    /// face. Equal cash-flow notionals depend on the coupon and come from
    /// [`EqualCashFlowSolver`](crate::equal_cash_flow::EqualCashFlowSolver).
    pub fn build(
        policy: &AmortizationPolicy,
        face_amount: Option<f64>,
        schedule: &Schedule,
    ) -> LoanResult<NotionalSchedule> {
        match policy {
            AmortizationPolicy::EqualPrincipal => {
                let face = face_amount.ok_or_else(|| LoanError::missing_field("face_amount"))?;
                Self::equal_principal(face, schedule)
            }
            AmortizationPolicy::Explicit(amounts) => Self::explicit(amounts, schedule),
            AmortizationPolicy::EqualCashFlow => Err(LoanError::invalid_input(
                "equal cash-flow notionals require a coupon",
            )),
        }
    }

    /// Equal principal: `F, F(n-1)/n, ..., 0`.
    ///
    /// Each value is computed in closed form; the first is exactly the face
    /// and the last exactly zero.
    pub fn equal_principal(face_amount: f64, schedule: &Schedule) -> LoanResult<NotionalSchedule> {
        if !(face_amount > 0.0 && face_amount.is_finite()) {
            return Err(LoanError::invalid_input(format!(
                "face amount must be positive, got {face_amount}"
            )));
        }
        let n = schedule.periods();
        if n == 0 {
            return Err(LoanError::EmptySchedule);
        }

        let mut notionals: Vec<f64> = (0..=n)
            .map(|i| face_amount * (n - i) as f64 / n as f64)
            .collect();
        notionals[0] = face_amount;
        notionals[n] = 0.0;

        NotionalSchedule::new(schedule.clone(), notionals)
    }

    /// Explicit amortizations, one per period.
    ///
    /// The initial principal is the sum of the amounts; negative amounts
    /// increase the balance (draw-downs).
    pub fn explicit(amortizations: &[f64], schedule: &Schedule) -> LoanResult<NotionalSchedule> {
        let n = schedule.periods();
        if n == 0 {
            return Err(LoanError::EmptySchedule);
        }
        if amortizations.len() != n {
            return Err(LoanError::SizeMismatch {
                amortizations: amortizations.len(),
                periods: n,
            });
        }
        if let Some(bad) = amortizations.iter().find(|a| !a.is_finite()) {
            return Err(LoanError::invalid_input(format!(
                "amortization {bad} is not finite"
            )));
        }

        let mut notionals = Vec::with_capacity(n + 1);
        let mut outstanding: f64 = amortizations.iter().sum();
        notionals.push(outstanding);
        for amount in amortizations {
            outstanding -= amount;
            notionals.push(outstanding);
        }
        notionals[n] = 0.0;

        NotionalSchedule::new(schedule.clone(), notionals)
    }
}
