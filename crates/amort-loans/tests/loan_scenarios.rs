//! End-to-end loan construction scenarios.

use approx::assert_relative_eq;

use amort_core::prelude::*;
use amort_loans::prelude::*;

// =============================================================================
// HELPERS
// =============================================================================

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

fn annual(periods: usize) -> Schedule {
    Schedule::regular(date(2019, 10, 10), periods, Frequency::Annual).unwrap()
}

fn six_percent() -> InterestRate {
    InterestRate::new(
        0.06,
        DayCountConvention::Thirty360US,
        Compounding::Compounded,
        Frequency::Annual,
    )
}

fn upward_curve() -> InterpolatedDiscountCurve {
    InterpolatedDiscountCurve::new(
        date(2019, 10, 10),
        &[
            (date(2020, 10, 10), 0.975),
            (date(2021, 10, 10), 0.945),
            (date(2023, 10, 10), 0.880),
            (date(2029, 10, 10), 0.700),
        ],
    )
    .unwrap()
}

fn amounts_by_kind(loan: &Loan) -> (Vec<f64>, Vec<f64>) {
    let interest = loan.interest_cashflows().map(|cf| cf.amount).collect();
    let principal = loan.principal_cashflows().map(|cf| cf.amount).collect();
    (interest, principal)
}

// =============================================================================
// WORKED EXAMPLES
// =============================================================================

#[test]
fn equal_principal_two_annual_periods() {
    let loan = LoanBuilder::new()
        .face_amount(100.0)
        .schedule(annual(2))
        .equal_principal()
        .coupon(six_percent())
        .build()
        .unwrap();

    assert_eq!(loan.notional_schedule().notionals(), &[100.0, 50.0, 0.0]);

    let (interest, principal) = amounts_by_kind(&loan);
    assert_relative_eq!(interest[0], 6.0, epsilon = 1e-12);
    assert_relative_eq!(interest[1], 3.0, epsilon = 1e-12);
    assert_eq!(principal, vec![50.0, 50.0]);

    let dates: Vec<Date> = loan.cashflows().iter().map(|cf| cf.date).collect();
    assert_eq!(
        dates,
        vec![date(2020, 10, 10), date(2020, 10, 10), date(2021, 10, 10), date(2021, 10, 10)]
    );
}

#[test]
fn equal_cash_flow_two_annual_periods() {
    let loan = LoanBuilder::new()
        .face_amount(100.0)
        .schedule(annual(2))
        .equal_cash_flow()
        .coupon(six_percent())
        .build()
        .unwrap();

    let (interest, principal) = amounts_by_kind(&loan);
    assert_relative_eq!(interest[0], 6.0, epsilon = 1e-12);
    assert_relative_eq!(interest[1], 3.087, epsilon = 1e-3);
    assert_relative_eq!(principal[0], 48.544, epsilon = 1e-3);
    assert_relative_eq!(principal[1], 51.456, epsilon = 1e-3);

    for (i, p) in interest.iter().zip(&principal) {
        assert_relative_eq!(i + p, 54.544, epsilon = 1e-3);
    }
    assert_eq!(loan.notional_schedule().last(), 0.0);
}

#[test]
fn explicit_amounts_must_match_periods() {
    // 5 dates: start plus 4 payment dates
    let err = LoanBuilder::new()
        .schedule(annual(4))
        .explicit(vec![30.0, 30.0, 40.0])
        .coupon(six_percent())
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        LoanError::SizeMismatch {
            amortizations: 3,
            periods: 4
        }
    );
}

#[test]
fn single_period_is_a_bullet() {
    for policy in [
        AmortizationPolicy::EqualPrincipal,
        AmortizationPolicy::EqualCashFlow,
        AmortizationPolicy::Explicit(vec![100.0]),
    ] {
        let loan = LoanBuilder::new()
            .face_amount(100.0)
            .schedule(annual(1))
            .policy(policy)
            .coupon(six_percent())
            .build()
            .unwrap();

        let flows = loan.cashflows();
        assert_eq!(flows.len(), 2);
        assert!(flows[0].is_interest());
        assert_relative_eq!(flows[0].amount, 6.0, epsilon = 1e-12);
        assert_eq!(
            flows[1].kind,
            CashFlowKind::Principal(PrincipalKind::FinalRedemption)
        );
        assert_relative_eq!(flows[1].amount, 100.0, epsilon = 1e-12);
    }
}

#[test]
fn explicit_draw_down_is_preserved() {
    let loan = LoanBuilder::new()
        .schedule(annual(4))
        .explicit(vec![-50.0, 50.0, 0.0, 100.0])
        .coupon(six_percent())
        .build()
        .unwrap();

    assert_eq!(loan.face_amount(), 100.0);
    assert_eq!(
        loan.notional_schedule().notionals(),
        &[100.0, 150.0, 100.0, 100.0, 0.0]
    );
    let (interest, principal) = amounts_by_kind(&loan);
    assert_relative_eq!(interest[1], 9.0, epsilon = 1e-12);
    assert_eq!(principal[0], -50.0);
}

#[test]
fn simple_compounding_leaves_residue_for_final_redemption() {
    let coupon = InterestRate::new(
        0.06,
        DayCountConvention::Thirty360US,
        Compounding::Simple,
        Frequency::Monthly,
    );
    let schedule = Schedule::regular(date(2020, 1, 15), 12, Frequency::Monthly).unwrap();
    let decomposition = EqualCashFlowSolver::decompose(100_000.0, &coupon, &schedule).unwrap();
    assert!(decomposition.residual() > 0.0);

    let loan = LoanBuilder::new()
        .face_amount(100_000.0)
        .schedule(schedule)
        .equal_cash_flow()
        .coupon(coupon)
        .build()
        .unwrap();

    let payments: Vec<f64> = loan
        .cashflows()
        .chunks(2)
        .map(|pair| pair[0].amount + pair[1].amount)
        .collect();
    let target = decomposition.target_cash_flow;
    for payment in &payments[..11] {
        assert_relative_eq!(*payment, target, max_relative = 1e-10);
    }
    assert_relative_eq!(
        payments[11],
        target + decomposition.residual(),
        max_relative = 1e-10
    );
    assert!(payments[11] > target);
    assert_eq!(loan.notional_schedule().last(), 0.0);
    assert_relative_eq!(loan.total_principal(), 100_000.0, max_relative = 1e-12);
}

// =============================================================================
// CURVE-IMPLIED COUPONS
// =============================================================================

#[test]
fn curve_implied_equal_cash_flow_round_trip() {
    let curve = upward_curve();
    let schedule = Schedule::regular(date(2019, 10, 10), 16, Frequency::Quarterly).unwrap();

    let implied = LoanBuilder::new()
        .face_amount(250_000.0)
        .schedule(schedule.clone())
        .equal_cash_flow()
        .curve_implied(
            &curve,
            DayCountConvention::Thirty360US,
            Compounding::Compounded,
            Frequency::Quarterly,
        )
        .build()
        .unwrap();

    let coupon = *implied.coupon().fixed_rate().unwrap();
    assert!(coupon.rate() > 0.0 && coupon.rate() < 0.2);

    // Feeding the coupon back reproduces the schedule
    let replay = LoanBuilder::new()
        .face_amount(250_000.0)
        .schedule(schedule)
        .equal_cash_flow()
        .coupon(coupon)
        .build()
        .unwrap();

    let accuracy = CouponSolverConfig::default().accuracy;
    for (a, b) in implied.principal_cashflows().zip(replay.principal_cashflows()) {
        assert!((a.amount - b.amount).abs() <= 10.0 * accuracy);
    }

    let payments: Vec<f64> = implied
        .cashflows()
        .chunks(2)
        .map(|pair| pair[0].amount + pair[1].amount)
        .collect();
    for payment in &payments[..payments.len() - 1] {
        assert!((payment - payments[0]).abs() <= accuracy);
    }
}

#[test]
fn atm_coupon_reprices_to_par() {
    let curve = upward_curve();
    let schedule = Schedule::regular(date(2019, 10, 10), 10, Frequency::SemiAnnual).unwrap();

    let loan = LoanBuilder::new()
        .schedule(schedule)
        .explicit(vec![5.0, 5.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0])
        .curve_implied(
            &curve,
            DayCountConvention::Thirty360US,
            Compounding::Simple,
            Frequency::Annual,
        )
        .build()
        .unwrap();

    let npv = loan.npv(&curve, date(2019, 10, 10)).unwrap();
    assert_relative_eq!(npv, 100.0, epsilon = 1e-9);

    let recomputed = atm_rate(loan.cashflows(), &curve, date(2019, 10, 10), 100.0).unwrap();
    assert_relative_eq!(recomputed, loan.coupon().fixed_rate().unwrap().rate(), epsilon = 1e-12);
}

#[test]
fn floating_loan_par_spread() {
    let forecast = upward_curve();
    let schedule = Schedule::regular(date(2019, 10, 10), 8, Frequency::Quarterly).unwrap();

    let loan = FloatingRateLoanBuilder::new()
        .amortizations(vec![12.5; 8])
        .schedule(schedule)
        .forecast_curve(&forecast)
        .spread(FloatingSpread::CurveImplied)
        .build()
        .unwrap();

    assert_relative_eq!(loan.coupon().spread().unwrap(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(loan.npv(&forecast, date(2019, 10, 10)).unwrap(), 100.0, epsilon = 1e-9);
    assert_eq!(loan.policy(), PolicyKind::Explicit);
}

// =============================================================================
// ACCESSORS AND SERIALIZATION
// =============================================================================

#[test]
fn notional_lookup_and_average_life() {
    let loan = LoanBuilder::new()
        .face_amount(100.0)
        .schedule(annual(2))
        .coupon(six_percent())
        .build()
        .unwrap();

    assert_eq!(loan.notional_at(date(2020, 1, 1)), 100.0);
    assert_eq!(loan.notional_at(date(2021, 1, 1)), 50.0);
    assert_eq!(loan.notional_at(date(2022, 1, 1)), 0.0);
    assert_relative_eq!(loan.weighted_average_life().unwrap(), 1.5, epsilon = 1e-12);
}

#[test]
fn loan_serde_round_trip() {
    let loan = LoanBuilder::new()
        .face_amount(100.0)
        .schedule(annual(3))
        .equal_cash_flow()
        .coupon(six_percent())
        .build()
        .unwrap();

    let json = serde_json::to_string(&loan).unwrap();
    let restored: Loan = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, loan);
}

#[test]
fn config_from_json_uses_defaults() {
    let config: LoanConfig = serde_json::from_str(r#"{"solver": {"accuracy": 1e-8}}"#).unwrap();
    assert_eq!(config.solver.accuracy, 1e-8);
    assert_eq!(config.solver.max_iterations, 10_000);
    assert_eq!(config.principal_tolerance, 1e-6);
    assert!(config.is_valid());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_matches_sequential() {
    let builders: Vec<LoanBuilder<'_>> = (1..=20)
        .map(|n| {
            LoanBuilder::new()
                .face_amount(1_000.0)
                .schedule(annual(n))
                .equal_cash_flow()
                .coupon(six_percent())
        })
        .collect();

    let sequential = build_loans(builders.clone());
    let parallel = build_loans_parallel(builders);
    assert_eq!(sequential, parallel);
}
