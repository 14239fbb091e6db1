//! Cash-flow events produced by loan assembly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use amort_core::Date;

/// Accrual details of an interest payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestAccrual {
    /// Start of the accrual period.
    pub accrual_start: Date,
    /// End of the accrual period (the payment date).
    pub accrual_end: Date,
    /// Outstanding principal over the period.
    pub nominal: f64,
    /// Annualized coupon rate applied (forward plus spread for floating loans).
    pub rate: f64,
    /// Accrual year fraction under the coupon day count.
    pub accrual_period: f64,
}

/// Principal payment subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrincipalKind {
    /// Partial repayment before maturity.
    Amortization,
    /// Repayment on the last boundary.
    FinalRedemption,
}

/// What a cash flow pays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CashFlowKind {
    /// Interest on the outstanding principal.
    Interest(InterestAccrual),
    /// Principal repayment.
    Principal(PrincipalKind),
}

impl CashFlowKind {
    /// Ordering rank on a shared date: interest before principal.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            CashFlowKind::Interest(_) => 0,
            CashFlowKind::Principal(_) => 1,
        }
    }
}

/// A single dated payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEvent {
    /// Payment date.
    pub date: Date,
    /// Signed amount; negative principal is a draw-down.
    pub amount: f64,
    /// Payment kind.
    pub kind: CashFlowKind,
}

impl CashFlowEvent {
    /// Creates an interest payment.
    #[must_use]
    pub fn interest(amount: f64, accrual: InterestAccrual) -> Self {
        Self {
            date: accrual.accrual_end,
            amount,
            kind: CashFlowKind::Interest(accrual),
        }
    }

    /// Creates a principal payment.
    #[must_use]
    pub fn principal(date: Date, amount: f64, kind: PrincipalKind) -> Self {
        Self {
            date,
            amount,
            kind: CashFlowKind::Principal(kind),
        }
    }

    /// Returns true for interest payments.
    #[must_use]
    pub fn is_interest(&self) -> bool {
        matches!(self.kind, CashFlowKind::Interest(_))
    }

    /// Returns true for principal payments.
    #[must_use]
    pub fn is_principal(&self) -> bool {
        matches!(self.kind, CashFlowKind::Principal(_))
    }

    /// Accrual details, for interest payments.
    #[must_use]
    pub fn accrual(&self) -> Option<&InterestAccrual> {
        match &self.kind {
            CashFlowKind::Interest(accrual) => Some(accrual),
            CashFlowKind::Principal(_) => None,
        }
    }

    /// Orders by date, then interest before principal.
    #[must_use]
    pub fn schedule_order(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.kind.rank().cmp(&other.kind.rank()))
    }
}

impl fmt::Display for CashFlowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            CashFlowKind::Interest(_) => "Interest",
            CashFlowKind::Principal(PrincipalKind::Amortization) => "Amortization",
            CashFlowKind::Principal(PrincipalKind::FinalRedemption) => "Redemption",
        };
        write!(f, "{} {:>12} {:.6}", self.date, label, self.amount)
    }
}

/// Sum of principal payments.
#[must_use]
pub fn total_principal(cashflows: &[CashFlowEvent]) -> f64 {
    cashflows
        .iter()
        .filter(|cf| cf.is_principal())
        .map(|cf| cf.amount)
        .sum()
}

/// Sum of interest payments.
#[must_use]
pub fn total_interest(cashflows: &[CashFlowEvent]) -> f64 {
    cashflows
        .iter()
        .filter(|cf| cf.is_interest())
        .map(|cf| cf.amount)
        .sum()
}
