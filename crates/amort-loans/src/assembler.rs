//! Cash-flow assembly from a notional schedule and a coupon.

use amort_core::{Date, InterestRate, RateConvention};

use crate::cashflows::{CashFlowEvent, InterestAccrual, PrincipalKind};
use crate::error::{LoanError, LoanResult};
use crate::notional::NotionalSchedule;

/// Interest accrued per unit of principal over one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodAccrual {
    /// Annualized rate reported on the interest event.
    pub rate: f64,
    /// Accrual year fraction.
    pub accrual_period: f64,
    /// Interest per unit of principal.
    pub interest_factor: f64,
}

/// How a coupon accrues over a period.
///
/// Implemented by fixed rates and by floating projections so the same
/// assembler serves both.
pub trait CouponAccrual {
    /// Accrual over `[start, end]`.
    fn accrue(&self, start: Date, end: Date) -> LoanResult<PeriodAccrual>;
}

impl CouponAccrual for InterestRate {
    fn accrue(&self, start: Date, end: Date) -> LoanResult<PeriodAccrual> {
        Ok(PeriodAccrual {
            rate: self.rate(),
            accrual_period: self.year_fraction(start, end)?,
            interest_factor: self.compound_factor(start, end)? - 1.0,
        })
    }
}

/// Turns a notional schedule and a coupon into ordered cash flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashFlowAssembler;

impl CashFlowAssembler {
    /// Assembles interest and principal events.
    ///
    /// Per period `i`, interest on `notional[i]` and principal
    /// `notional[i] - notional[i+1]` are both paid on the period end date.
    /// All interest events are generated before all principal events, then
    /// the sequence is stably sorted by date and kind rank so that, on a
    /// shared date, interest always precedes principal.
    pub fn assemble<C>(notionals: &NotionalSchedule, coupon: &C) -> LoanResult<Vec<CashFlowEvent>>
    where
        C: CouponAccrual + ?Sized,
    {
        let dates = notionals.dates();
        let balances = notionals.notionals();
        let periods = dates.len().saturating_sub(1);
        let mut cashflows = Vec::with_capacity(2 * periods);

        for (i, w) in dates.windows(2).enumerate() {
            let (start, end) = (w[0], w[1]);
            let accrual = coupon.accrue(start, end)?;
            let nominal = balances[i];
            cashflows.push(CashFlowEvent::interest(
                nominal * accrual.interest_factor,
                InterestAccrual {
                    accrual_start: start,
                    accrual_end: end,
                    nominal,
                    rate: accrual.rate,
                    accrual_period: accrual.accrual_period,
                },
            ));
        }

        for (i, w) in balances.windows(2).enumerate() {
            let kind = if i + 1 == periods {
                PrincipalKind::FinalRedemption
            } else {
                PrincipalKind::Amortization
            };
            cashflows.push(CashFlowEvent::principal(dates[i + 1], w[0] - w[1], kind));
        }

        cashflows.sort_by(CashFlowEvent::schedule_order);

        if cashflows.is_empty() {
            return Err(LoanError::EmptyCashFlows);
        }
        Ok(cashflows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notional::NotionalScheduleBuilder;
    use amort_core::{Compounding, DayCountConvention, Frequency, Schedule};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn six_percent() -> InterestRate {
        InterestRate::new(
            0.06,
            DayCountConvention::Thirty360US,
            Compounding::Compounded,
            Frequency::Annual,
        )
    }

    #[test]
    fn test_equal_principal_six_percent() {
        let schedule = Schedule::regular(date(2019, 10, 10), 2, Frequency::Annual).unwrap();
        let ns = NotionalScheduleBuilder::equal_principal(100.0, &schedule).unwrap();
        let flows = CashFlowAssembler::assemble(&ns, &six_percent()).unwrap();

        assert_eq!(flows.len(), 4);
        assert!(flows[0].is_interest());
        assert_relative_eq!(flows[0].amount, 6.0, epsilon = 1e-12);
        assert!(flows[1].is_principal());
        assert_relative_eq!(flows[1].amount, 50.0, epsilon = 1e-12);
        assert_relative_eq!(flows[2].amount, 3.0, epsilon = 1e-12);
        assert_eq!(
            flows[3].kind,
            crate::cashflows::CashFlowKind::Principal(PrincipalKind::FinalRedemption)
        );
        assert_relative_eq!(flows[3].amount, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_accrual_details() {
        let schedule = Schedule::regular(date(2019, 10, 10), 2, Frequency::Annual).unwrap();
        let ns = NotionalScheduleBuilder::equal_principal(100.0, &schedule).unwrap();
        let flows = CashFlowAssembler::assemble(&ns, &six_percent()).unwrap();

        let accrual = flows[2].accrual().unwrap();
        assert_eq!(accrual.accrual_start, date(2020, 10, 10));
        assert_eq!(accrual.accrual_end, date(2021, 10, 10));
        assert_eq!(accrual.nominal, 50.0);
        assert_eq!(accrual.rate, 0.06);
        assert_relative_eq!(accrual.accrual_period, 1.0);
    }

    #[test]
    fn test_single_period() {
        let schedule = Schedule::regular(date(2019, 10, 10), 1, Frequency::Annual).unwrap();
        let ns = NotionalScheduleBuilder::equal_principal(100.0, &schedule).unwrap();
        let flows = CashFlowAssembler::assemble(&ns, &six_percent()).unwrap();

        assert_eq!(flows.len(), 2);
        assert!(flows[0].is_interest());
        assert_eq!(
            flows[1].kind,
            crate::cashflows::CashFlowKind::Principal(PrincipalKind::FinalRedemption)
        );
        assert_eq!(flows[1].amount, 100.0);
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let schedule = Schedule::regular(date(2020, 1, 31), 12, Frequency::Monthly).unwrap();
        let ns = NotionalScheduleBuilder::equal_principal(1_000.0, &schedule).unwrap();
        let a = CashFlowAssembler::assemble(&ns, &six_percent()).unwrap();
        let b = CashFlowAssembler::assemble(&ns, &six_percent()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_interest_precedes_principal_on_every_date() {
        let schedule = Schedule::regular(date(2020, 1, 15), 6, Frequency::Quarterly).unwrap();
        let ns = NotionalScheduleBuilder::explicit(&[10.0, -5.0, 20.0, 0.0, 25.0, 50.0], &schedule)
            .unwrap();
        let flows = CashFlowAssembler::assemble(&ns, &six_percent()).unwrap();

        for pair in flows.windows(2) {
            assert!(pair[0].date <= pair[1].date);
            if pair[0].date == pair[1].date {
                assert!(pair[0].is_interest());
                assert!(pair[1].is_principal());
            }
        }
    }
}
