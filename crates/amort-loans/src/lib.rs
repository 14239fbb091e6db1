//! # Amort Loans
//!
//! Cash-flow synthesis for amortizing loans.
//!
//! Given a payment schedule, a face amount or explicit amortizations, and a
//! coupon that is either known or implied by a discount curve, this crate
//! produces the ordered interest and principal events of the loan.
//!
//! - **Notional Schedules**: equal principal, explicit amortizations
//!   (draw-downs allowed) and equal cash flow
//! - **Cash-Flow Assembly**: interest and principal per period, with interest
//!   first on shared dates
//! - **Coupon Solving**: the equal cash-flow coupon by Brent's method and the
//!   closed-form at-the-market coupon
//! - **Floating Loans**: forward projection plus a fixed or par spread
//! - **Analytics**: NPV, BPS, ATM rate and weighted average life
//!
//! ## Example
//!
//! ```rust
//! use amort_core::prelude::*;
//! use amort_loans::prelude::*;
//!
//! let schedule = Schedule::regular(Date::from_ymd(2019, 10, 10).unwrap(), 2, Frequency::Annual).unwrap();
//! let rate = InterestRate::new(0.06, DayCountConvention::Thirty360US, Compounding::Compounded, Frequency::Annual);
//!
//! let loan = LoanBuilder::new()
//!     .face_amount(100.0)
//!     .schedule(schedule)
//!     .equal_cash_flow()
//!     .coupon(rate)
//!     .build()
//!     .unwrap();
//!
//! let interest: Vec<f64> = loan.interest_cashflows().map(|cf| cf.amount).collect();
//! assert!((interest[0] - 6.0).abs() < 1e-12);
//! assert!((interest[1] - 3.087).abs() < 1e-3);
//! ```
//!
//! ## Logging
//!
//! Build stages and solver completion are reported through `tracing` at
//! `debug`; negative amortization and rejected loans at `warn`. No
//! subscriber is installed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::return_self_not_must_use)]

pub mod analytics;
pub mod assembler;
pub mod cashflows;
pub mod config;
pub mod coupon_finder;
pub mod equal_cash_flow;
pub mod error;
pub mod floating;
pub mod loan;
pub mod notional;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analytics::{atm_rate, bps, npv, weighted_average_life};
    pub use crate::assembler::{CashFlowAssembler, CouponAccrual, PeriodAccrual};
    pub use crate::cashflows::{CashFlowEvent, CashFlowKind, InterestAccrual, PrincipalKind};
    pub use crate::config::{CouponSolverConfig, LoanConfig, Validate, ValidationError};
    pub use crate::coupon_finder::{CouponRootFinder, CouponSolution};
    pub use crate::equal_cash_flow::{EqualCashFlowDecomposition, EqualCashFlowSolver};
    pub use crate::error::{LoanError, LoanResult};
    pub use crate::floating::{FloatingRateLoanBuilder, FloatingSpread, ForwardProjection};
    pub use crate::loan::{build_loans, CouponSpec, Loan, LoanBuilder, LoanCoupon};
    pub use crate::notional::{
        AmortizationPolicy, NotionalSchedule, NotionalScheduleBuilder, PolicyKind,
    };

    #[cfg(feature = "parallel")]
    pub use crate::loan::build_loans_parallel;
}

pub use cashflows::{CashFlowEvent, CashFlowKind, PrincipalKind};
pub use error::{LoanError, LoanResult};
pub use loan::{CouponSpec, Loan, LoanBuilder};
pub use notional::{AmortizationPolicy, NotionalSchedule};
