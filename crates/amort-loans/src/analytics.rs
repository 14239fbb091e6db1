//! Cash-flow analytics.
//!
//! Free functions over any cash-flow slice; none of them know how the flows
//! were produced. Flows paid on or before `settlement` are excluded and
//! values are expressed as of `settlement`.

use amort_core::{Date, DayCountConvention, DiscountCurve};

use crate::cashflows::CashFlowEvent;
use crate::error::{LoanError, LoanResult};

/// One basis point.
pub const BASIS_POINT: f64 = 1e-4;

fn settlement_discount<C>(curve: &C, settlement: Date) -> LoanResult<f64>
where
    C: DiscountCurve + ?Sized,
{
    let df = curve.discount(settlement)?;
    if !(df > 0.0 && df.is_finite()) {
        return Err(LoanError::invalid_input(format!(
            "discount factor {df} at settlement {settlement}"
        )));
    }
    Ok(df)
}

fn pending(cashflows: &[CashFlowEvent], settlement: Date) -> impl Iterator<Item = &CashFlowEvent> {
    cashflows.iter().filter(move |cf| cf.date > settlement)
}

/// Present value of the flows after `settlement`.
pub fn npv<C>(cashflows: &[CashFlowEvent], curve: &C, settlement: Date) -> LoanResult<f64>
where
    C: DiscountCurve + ?Sized,
{
    let ds = settlement_discount(curve, settlement)?;
    let mut total = 0.0;
    for cf in pending(cashflows, settlement) {
        total += cf.amount * curve.discount(cf.date)?;
    }
    Ok(total / ds)
}

/// Value change for a one basis point parallel move in the coupon rate.
///
/// `Σ nominal · τ · D(t)` over interest events, times one basis point.
pub fn bps<C>(cashflows: &[CashFlowEvent], curve: &C, settlement: Date) -> LoanResult<f64>
where
    C: DiscountCurve + ?Sized,
{
    Ok(annuity(cashflows, curve, settlement)? * BASIS_POINT)
}

fn annuity<C>(cashflows: &[CashFlowEvent], curve: &C, settlement: Date) -> LoanResult<f64>
where
    C: DiscountCurve + ?Sized,
{
    let ds = settlement_discount(curve, settlement)?;
    let mut total = 0.0;
    for cf in pending(cashflows, settlement) {
        if let Some(accrual) = cf.accrual() {
            total += accrual.nominal * accrual.accrual_period * curve.discount(cf.date)?;
        }
    }
    Ok(total / ds)
}

/// Coupon rate that makes the flows worth `target_npv` at `settlement`.
///
/// Interest amounts are ignored; only their nominal and accrual period are
/// used. The rate is simple, per unit of accrual period:
/// `(target - PV(principal)) / Σ nominal · τ · D`.
pub fn atm_rate<C>(
    cashflows: &[CashFlowEvent],
    curve: &C,
    settlement: Date,
    target_npv: f64,
) -> LoanResult<f64>
where
    C: DiscountCurve + ?Sized,
{
    let ds = settlement_discount(curve, settlement)?;
    let mut principal_pv = 0.0;
    for cf in pending(cashflows, settlement).filter(|cf| cf.is_principal()) {
        principal_pv += cf.amount * curve.discount(cf.date)?;
    }
    let annuity = annuity(cashflows, curve, settlement)?;
    if annuity == 0.0 {
        return Err(LoanError::invalid_input(
            "no interest-bearing periods after settlement",
        ));
    }
    Ok((target_npv - principal_pv / ds) / annuity)
}

/// Average time to principal repayment, weighted by amount, in years from
/// `start` under `day_count`.
pub fn weighted_average_life(
    cashflows: &[CashFlowEvent],
    start: Date,
    day_count: DayCountConvention,
) -> LoanResult<f64> {
    let mut weighted = 0.0;
    let mut principal = 0.0;
    for cf in cashflows.iter().filter(|cf| cf.is_principal() && cf.date > start) {
        let t = day_count.year_fraction_f64(start, cf.date)?;
        weighted += cf.amount * t;
        principal += cf.amount;
    }
    if principal == 0.0 {
        return Err(LoanError::invalid_input("no principal repaid after start"));
    }
    Ok(weighted / principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflows::{InterestAccrual, PrincipalKind};
    use amort_core::{Compounding, FlatForward, Frequency, InterestRate};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    fn curve(r: f64) -> FlatForward {
        FlatForward::new(
            date(2020, 1, 1),
            InterestRate::new(
                r,
                DayCountConvention::Thirty360US,
                Compounding::Compounded,
                Frequency::Annual,
            ),
        )
    }

    /// 100 bullet, two annual 5% coupons.
    fn bullet() -> Vec<CashFlowEvent> {
        let accrual = |s: Date, e: Date| InterestAccrual {
            accrual_start: s,
            accrual_end: e,
            nominal: 100.0,
            rate: 0.05,
            accrual_period: 1.0,
        };
        vec![
            CashFlowEvent::interest(5.0, accrual(date(2020, 1, 1), date(2021, 1, 1))),
            CashFlowEvent::principal(date(2021, 1, 1), 0.0, PrincipalKind::Amortization),
            CashFlowEvent::interest(5.0, accrual(date(2021, 1, 1), date(2022, 1, 1))),
            CashFlowEvent::principal(date(2022, 1, 1), 100.0, PrincipalKind::FinalRedemption),
        ]
    }

    #[test]
    fn test_par_bond_npv() {
        let npv = npv(&bullet(), &curve(0.05), date(2020, 1, 1)).unwrap();
        assert_relative_eq!(npv, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_settlement_excludes_paid_flows() {
        let value = npv(&bullet(), &curve(0.05), date(2021, 1, 1)).unwrap();
        assert_relative_eq!(value, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bps() {
        let value = bps(&bullet(), &curve(0.05), date(2020, 1, 1)).unwrap();
        let expected = 100.0 * (1.0 / 1.05 + 1.0 / 1.05_f64.powi(2)) * 1e-4;
        assert_relative_eq!(value, expected, epsilon = 1e-14);
    }

    #[test]
    fn test_atm_rate_recovers_par_coupon() {
        let rate = atm_rate(&bullet(), &curve(0.05), date(2020, 1, 1), 100.0).unwrap();
        assert_relative_eq!(rate, 0.05, epsilon = 1e-12);

        let rate = atm_rate(&bullet(), &curve(0.07), date(2020, 1, 1), 100.0).unwrap();
        assert_relative_eq!(rate, 0.07, epsilon = 1e-12);
    }

    #[test]
    fn test_atm_rate_without_coupons() {
        let flows = vec![CashFlowEvent::principal(
            date(2021, 1, 1),
            100.0,
            PrincipalKind::FinalRedemption,
        )];
        assert!(atm_rate(&flows, &curve(0.05), date(2020, 1, 1), 100.0).is_err());
    }

    #[test]
    fn test_weighted_average_life() {
        let wal =
            weighted_average_life(&bullet(), date(2020, 1, 1), DayCountConvention::Thirty360US)
                .unwrap();
        assert_relative_eq!(wal, 2.0, epsilon = 1e-12);
    }
}
