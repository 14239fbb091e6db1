//! Frequency and compounding types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment or compounding frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    /// Once per year
    #[default]
    Annual,
    /// Twice per year
    SemiAnnual,
    /// Four times per year
    Quarterly,
    /// Twelve times per year
    Monthly,
}

impl Frequency {
    /// Returns the number of periods per year.
    #[must_use]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    /// Returns the number of months per period.
    #[must_use]
    pub fn months_per_period(&self) -> u32 {
        12 / self.periods_per_year()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Annual => "Annual",
            Frequency::SemiAnnual => "Semi-Annual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
        };
        write!(f, "{name}")
    }
}

/// How interest accrues over a period of `t` years.
///
/// The frequency used by `Compounded` variants comes from the owning
/// [`InterestRate`](super::InterestRate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Compounding {
    /// `1 + r t`
    Simple,
    /// `(1 + r/f)^(f t)`
    #[default]
    Compounded,
    /// `exp(r t)`
    Continuous,
    /// Simple up to one period, compounded beyond it
    SimpleThenCompounded,
}

impl fmt::Display for Compounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compounding::Simple => "Simple",
            Compounding::Compounded => "Compounded",
            Compounding::Continuous => "Continuous",
            Compounding::SimpleThenCompounded => "Simple-then-Compounded",
        };
        write!(f, "{name}")
    }
}
