//! Typed computation outcomes and data-quality warnings.
//!
//! Every "value not computable" case is an explicit tagged state, never a
//! sentinel number: a missing PE band serializes as
//! `{"status":"unavailable","reason":{...}}`, not as `0` or `NaN`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fiscal::FiscalQuarter;
use crate::types::Metric;

/// Outcome of a sub-computation: a value, or a typed reason it could not
/// be produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Computed<T> {
    /// The computation produced a value.
    Available(T),
    /// The computation could not be performed.
    Unavailable(UnavailableReason),
}

impl<T> Computed<T> {
    /// Returns true if a value is available.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns the value, if available.
    #[must_use]
    pub const fn available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    /// Returns the reason the value is unavailable, if any.
    #[must_use]
    pub const fn unavailable(&self) -> Option<&UnavailableReason> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(reason) => Some(reason),
        }
    }
}

/// Why a sub-computation could not produce a value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Fewer valid consecutive quarters than the computation requires.
    InsufficientHistory {
        /// Quarters required.
        required: usize,
        /// Quarters available.
        available: usize,
    },
    /// Trailing twelve-month earnings are zero or negative.
    NonPositiveEarnings,
    /// The discount rate does not exceed the terminal growth rate.
    DiscountNotAboveGrowth {
        /// The discount rate (WACC).
        discount_rate: f64,
        /// The terminal growth rate.
        terminal_growth: f64,
    },
    /// No market observation could be matched.
    MissingMarketData,
    /// A required input was absent with no default policy configured.
    MissingInput {
        /// Name of the missing input.
        field: String,
    },
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientHistory {
                required,
                available,
            } => write!(
                f,
                "insufficient history: need {required} quarters, have {available}"
            ),
            Self::NonPositiveEarnings => {
                write!(f, "trailing twelve-month earnings are not positive")
            }
            Self::DiscountNotAboveGrowth {
                discount_rate,
                terminal_growth,
            } => write!(
                f,
                "discount rate {discount_rate} does not exceed terminal growth {terminal_growth}"
            ),
            Self::MissingMarketData => write!(f, "no market observations available"),
            Self::MissingInput { field } => write!(f, "missing input: {field}"),
        }
    }
}

/// A data-quality condition found during transformation or valuation.
///
/// Warnings are recorded and propagated to the final result; they never
/// abort the pipeline and are never silently swallowed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// A cumulative figure decreased for a metric that must accumulate.
    /// The differenced value is kept as reported, not corrected.
    NonMonotonicCumulative {
        /// The offending metric.
        metric: Metric,
        /// Fiscal year of the violation.
        fiscal_year: i32,
        /// Quarter whose cumulative figure fell below its predecessor's.
        quarter: FiscalQuarter,
    },
    /// A cumulative quarter could not be differenced because its prior
    /// quarter is absent. The quarter stays absent; it is never estimated.
    MissingPriorQuarter {
        /// Fiscal year of the underivable quarter.
        fiscal_year: i32,
        /// The underivable quarter.
        quarter: FiscalQuarter,
    },
    /// A fact reported in a different currency than the series and was
    /// excluded rather than coerced.
    CurrencyMismatch {
        /// Currency of the series.
        expected: String,
        /// Currency of the excluded fact.
        found: String,
        /// Fiscal year of the excluded fact.
        fiscal_year: i32,
    },
    /// A malformed fact was rejected by validation and dropped.
    RejectedFact {
        /// Fiscal year of the rejected fact.
        fiscal_year: i32,
        /// Validation failure detail.
        detail: String,
    },
    /// A restated figure overwrote an already-reconstructed quarter.
    QuarterRestated {
        /// Fiscal year of the restated quarter.
        fiscal_year: i32,
        /// The restated quarter.
        quarter: FiscalQuarter,
    },
    /// No beta was supplied; the configured default was applied.
    DefaultBetaApplied {
        /// The default beta used.
        beta: f64,
    },
    /// No market observation existed on or before a report date; that
    /// period was excluded from the PE sample.
    MissingObservation {
        /// The report date with no matching observation.
        report_date: NaiveDate,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonMonotonicCumulative {
                metric,
                fiscal_year,
                quarter,
            } => write!(
                f,
                "cumulative {metric} decreased at FY{fiscal_year} {quarter}"
            ),
            Self::MissingPriorQuarter {
                fiscal_year,
                quarter,
            } => write!(
                f,
                "FY{fiscal_year} {quarter} cannot be derived: prior quarter missing"
            ),
            Self::CurrencyMismatch {
                expected,
                found,
                fiscal_year,
            } => write!(
                f,
                "FY{fiscal_year} fact in {found} excluded from {expected} series"
            ),
            Self::RejectedFact {
                fiscal_year,
                detail,
            } => write!(f, "rejected FY{fiscal_year} fact: {detail}"),
            Self::QuarterRestated {
                fiscal_year,
                quarter,
            } => write!(f, "FY{fiscal_year} {quarter} restated"),
            Self::DefaultBetaApplied { beta } => {
                write!(f, "beta not supplied, default {beta} applied")
            }
            Self::MissingObservation { report_date } => {
                write!(f, "no market observation on or before {report_date}")
            }
        }
    }
}
