//! Discount curves.
//!
//! The loan engine only ever asks a curve for discount factors at dates on or
//! after its reference date. Two implementations are provided:
//!
//! - [`FlatForward`]: a single [`InterestRate`] applied from the reference date
//! - [`InterpolatedDiscountCurve`]: log-linear interpolation on discount
//!   factor pillars, extrapolating the last forward past the final pillar

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Date, InterestRate, RateConvention};

/// A read-only discount factor curve.
///
/// Implementations must be thread-safe so that independent loans can be
/// built against the same curve concurrently.
pub trait DiscountCurve: Send + Sync {
    /// The date at which the discount factor is 1.
    fn reference_date(&self) -> Date;

    /// Discount factor from the reference date to `date`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CurveError` for dates before the reference date.
    fn discount(&self, date: Date) -> CoreResult<f64>;

    /// Forward discount factor from `start` to `end`: `D(end) / D(start)`.
    fn forward_discount(&self, start: Date, end: Date) -> CoreResult<f64> {
        let df_start = self.discount(start)?;
        if df_start <= 0.0 {
            return Err(CoreError::curve_error(format!(
                "non-positive discount factor {df_start} at {start}"
            )));
        }
        Ok(self.discount(end)? / df_start)
    }
}

fn check_not_before(reference: Date, date: Date) -> CoreResult<()> {
    if date < reference {
        return Err(CoreError::curve_error(format!(
            "{date} is before the curve reference date {reference}"
        )));
    }
    Ok(())
}

/// Flat forward curve: every discount factor comes from one rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatForward {
    reference_date: Date,
    rate: InterestRate,
}

impl FlatForward {
    /// Creates a flat curve anchored at `reference_date`.
    #[must_use]
    pub fn new(reference_date: Date, rate: InterestRate) -> Self {
        Self {
            reference_date,
            rate,
        }
    }

    /// The curve's rate.
    #[must_use]
    pub fn rate(&self) -> InterestRate {
        self.rate
    }
}

impl DiscountCurve for FlatForward {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn discount(&self, date: Date) -> CoreResult<f64> {
        check_not_before(self.reference_date, date)?;
        self.rate.discount_factor(self.reference_date, date)
    }
}

/// Discount curve interpolated log-linearly between pillars.
///
/// Time is measured in calendar days from the reference date, which is an
/// implicit pillar with discount factor 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveNodes")]
pub struct InterpolatedDiscountCurve {
    reference_date: Date,
    /// (days from reference, ln discount factor), including the origin.
    nodes: Vec<(f64, f64)>,
}

impl InterpolatedDiscountCurve {
    /// Builds a curve from `(date, discount_factor)` pillars.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CurveError` if there are no pillars, a pillar is
    /// not strictly after the previous one (the reference date counts as the
    /// first), or a discount factor is not positive and finite.
    pub fn new(reference_date: Date, pillars: &[(Date, f64)]) -> CoreResult<Self> {
        if pillars.is_empty() {
            return Err(CoreError::curve_error("at least one pillar is required"));
        }

        let mut nodes = Vec::with_capacity(pillars.len() + 1);
        nodes.push((0.0, 0.0));
        let mut previous = reference_date;
        for &(date, df) in pillars {
            if date <= previous {
                return Err(CoreError::curve_error(format!(
                    "pillar {date} is not after {previous}"
                )));
            }
            if !(df > 0.0 && df.is_finite()) {
                return Err(CoreError::curve_error(format!(
                    "invalid discount factor {df} at {date}"
                )));
            }
            nodes.push((reference_date.days_between(&date) as f64, df.ln()));
            previous = date;
        }

        Ok(Self {
            reference_date,
            nodes,
        })
    }

    /// Number of pillars, excluding the reference date.
    #[must_use]
    pub fn pillar_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

#[derive(Deserialize)]
struct CurveNodes {
    reference_date: Date,
    nodes: Vec<(f64, f64)>,
}

impl TryFrom<CurveNodes> for InterpolatedDiscountCurve {
    type Error = CoreError;

    fn try_from(raw: CurveNodes) -> CoreResult<Self> {
        match raw.nodes.first() {
            Some(&(t, l)) if t == 0.0 && l == 0.0 => {}
            _ => {
                return Err(CoreError::curve_error(
                    "nodes must start at the reference date with discount factor 1",
                ))
            }
        }
        if raw.nodes.len() < 2 {
            return Err(CoreError::curve_error("at least one pillar is required"));
        }
        if let Some(&(t, l)) = raw.nodes.iter().find(|(t, l)| !(t.is_finite() && l.is_finite())) {
            return Err(CoreError::curve_error(format!("non-finite node ({t}, {l})")));
        }
        if let Some(pair) = raw.nodes.windows(2).find(|w| w[0].0 >= w[1].0) {
            return Err(CoreError::curve_error(format!(
                "node times must be strictly increasing: {} is followed by {}",
                pair[0].0, pair[1].0
            )));
        }
        Ok(Self {
            reference_date: raw.reference_date,
            nodes: raw.nodes,
        })
    }
}

impl DiscountCurve for InterpolatedDiscountCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn discount(&self, date: Date) -> CoreResult<f64> {
        check_not_before(self.reference_date, date)?;
        let t = self.reference_date.days_between(&date) as f64;

        // First segment whose right end covers t; past the last pillar the
        // final segment is extended.
        let idx = self
            .nodes
            .iter()
            .position(|&(ti, _)| ti >= t)
            .unwrap_or(self.nodes.len() - 1)
            .max(1);
        let (t0, l0) = self.nodes[idx - 1];
        let (t1, l1) = self.nodes[idx];
        let log_df = l0 + (l1 - l0) * (t - t0) / (t1 - t0);

        Ok(log_df.exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daycounts::DayCountConvention;
    use crate::types::{Compounding, Frequency};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_flat_forward() {
        let rate = InterestRate::new(
            0.05,
            DayCountConvention::Thirty360US,
            Compounding::Compounded,
            Frequency::Annual,
        );
        let curve = FlatForward::new(date(2020, 1, 1), rate);
        assert_relative_eq!(curve.discount(date(2020, 1, 1)).unwrap(), 1.0);
        assert_relative_eq!(
            curve.discount(date(2022, 1, 1)).unwrap(),
            1.0 / 1.1025,
            epsilon = 1e-12
        );
        assert!(curve.discount(date(2019, 12, 31)).is_err());
    }

    #[test]
    fn test_forward_discount() {
        let rate = InterestRate::new(
            0.04,
            DayCountConvention::Act365Fixed,
            Compounding::Continuous,
            Frequency::Annual,
        );
        let curve = FlatForward::new(date(2020, 1, 1), rate);
        let fwd = curve
            .forward_discount(date(2021, 1, 1), date(2022, 1, 1))
            .unwrap();
        assert_relative_eq!(fwd, (-0.04_f64 * 365.0 / 365.0).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_interpolated_hits_pillars() {
        let curve = InterpolatedDiscountCurve::new(
            date(2020, 1, 1),
            &[(date(2021, 1, 1), 0.97), (date(2022, 1, 1), 0.93)],
        )
        .unwrap();
        assert_relative_eq!(curve.discount(date(2020, 1, 1)).unwrap(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(curve.discount(date(2021, 1, 1)).unwrap(), 0.97, epsilon = 1e-12);
        assert_relative_eq!(curve.discount(date(2022, 1, 1)).unwrap(), 0.93, epsilon = 1e-12);
        assert_eq!(curve.pillar_count(), 2);
    }

    #[test]
    fn test_interpolated_log_linear() {
        let curve =
            InterpolatedDiscountCurve::new(date(2020, 1, 1), &[(date(2020, 1, 11), 0.81)]).unwrap();
        // Halfway in time is the geometric mean of 1.0 and 0.81
        assert_relative_eq!(curve.discount(date(2020, 1, 6)).unwrap(), 0.9, epsilon = 1e-12);
        // Extrapolation keeps the last forward
        assert_relative_eq!(curve.discount(date(2020, 1, 21)).unwrap(), 0.6561, epsilon = 1e-12);
    }

    #[test]
    fn test_interpolated_rejects_bad_pillars() {
        let reference = date(2020, 1, 1);
        assert!(InterpolatedDiscountCurve::new(reference, &[]).is_err());
        assert!(InterpolatedDiscountCurve::new(reference, &[(reference, 1.0)]).is_err());
        assert!(InterpolatedDiscountCurve::new(reference, &[(date(2021, 1, 1), -0.5)]).is_err());
        assert!(InterpolatedDiscountCurve::new(
            reference,
            &[(date(2022, 1, 1), 0.9), (date(2021, 1, 1), 0.95)]
        )
        .is_err());
    }

    #[test]
    fn test_interpolated_deserialize_validates() {
        let curve = InterpolatedDiscountCurve::new(
            date(2020, 1, 1),
            &[(date(2021, 1, 1), 0.97), (date(2022, 1, 1), 0.93)],
        )
        .unwrap();
        let json = serde_json::to_string(&curve).unwrap();
        let restored: InterpolatedDiscountCurve = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, curve);

        let bad = [
            r#"{"reference_date":"2020-01-01","nodes":[]}"#,
            r#"{"reference_date":"2020-01-01","nodes":[[0.0,0.0]]}"#,
            r#"{"reference_date":"2020-01-01","nodes":[[0.0,0.0],[366.0,-0.03],[366.0,-0.05]]}"#,
            r#"{"reference_date":"2020-01-01","nodes":[[0.0,0.0],[366.0,-0.03],[100.0,-0.05]]}"#,
            r#"{"reference_date":"2020-01-01","nodes":[[10.0,-0.01],[366.0,-0.03]]}"#,
        ];
        for json in bad {
            assert!(serde_json::from_str::<InterpolatedDiscountCurve>(json).is_err(), "{json}");
        }
    }
}
