//! Fiscal period definitions.
//!
//! This module defines [`FiscalQuarter`] for quarter labels and
//! [`ReportingBasis`] for how a reported figure accumulates over the year.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValuationError;

/// A fiscal quarter label (Q1 through Q4).
///
/// Variant order is chronological, so the derived `Ord` sorts quarters
/// within a fiscal year correctly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FiscalQuarter {
    /// First fiscal quarter.
    Q1,
    /// Second fiscal quarter.
    Q2,
    /// Third fiscal quarter.
    Q3,
    /// Fourth fiscal quarter.
    Q4,
}

impl FiscalQuarter {
    /// All quarters in chronological order.
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// Returns the quarter number (1-4).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    /// Returns the preceding quarter within the same fiscal year.
    ///
    /// Q1 has no predecessor: the fiscal-year boundary is never crossed
    /// when differencing cumulative figures.
    #[must_use]
    pub const fn prev_in_year(self) -> Option<Self> {
        match self {
            Self::Q1 => None,
            Self::Q2 => Some(Self::Q1),
            Self::Q3 => Some(Self::Q2),
            Self::Q4 => Some(Self::Q3),
        }
    }

    /// Returns the chronologically preceding `(fiscal_year, quarter)` key,
    /// crossing the fiscal-year boundary from Q1 back to the prior Q4.
    #[must_use]
    pub const fn prev_key(fiscal_year: i32, quarter: Self) -> (i32, Self) {
        match quarter {
            Self::Q1 => (fiscal_year - 1, Self::Q4),
            Self::Q2 => (fiscal_year, Self::Q1),
            Self::Q3 => (fiscal_year, Self::Q2),
            Self::Q4 => (fiscal_year, Self::Q3),
        }
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

impl TryFrom<u8> for FiscalQuarter {
    type Error = ValuationError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            other => Err(ValuationError::Validation(format!(
                "fiscal quarter must be 1-4, got {other}"
            ))),
        }
    }
}

/// How a reported figure accumulates over the fiscal year.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ReportingBasis {
    /// Year-to-date figures: quarter q reports the sum of quarters 1..=q.
    #[default]
    Cumulative,
    /// Discrete figures attributable to exactly one quarter.
    SingleQuarter,
    /// Full fiscal-year figures with no quarter attribution.
    Annual,
}
