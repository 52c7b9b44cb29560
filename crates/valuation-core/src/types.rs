//! Core data types for reported financial facts.
//!
//! This module defines the fundamental data structures:
//!
//! - [`EntityId`] - Security/company identifier
//! - [`Metric`] - The closed set of tracked metric names
//! - [`MetricSet`] - One period's metric values, each explicitly optional
//! - [`PeriodFact`] - One reported financial statement row
//! - [`MarketObservation`] - Price and market cap on a given date

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValuationError};
use crate::fiscal::{FiscalQuarter, ReportingBasis};

/// A security/company identifier.
///
/// Identifiers are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new identifier from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The closed set of metric names tracked per period.
///
/// Absence of a value is a typed state on [`MetricSet`], never a missing
/// dictionary key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Total revenue (flow).
    Revenue,
    /// Net income (flow).
    NetIncome,
    /// Operating cash flow (flow).
    OperatingCashFlow,
    /// Capital expenditures (flow).
    CapitalExpenditures,
    /// Interest expense (flow).
    InterestExpense,
    /// Total debt (point-in-time).
    TotalDebt,
    /// Cash and cash equivalents (point-in-time).
    CashAndEquivalents,
    /// Shares outstanding (point-in-time).
    SharesOutstanding,
}

impl Metric {
    /// All tracked metrics.
    pub const ALL: [Self; 8] = [
        Self::Revenue,
        Self::NetIncome,
        Self::OperatingCashFlow,
        Self::CapitalExpenditures,
        Self::InterestExpense,
        Self::TotalDebt,
        Self::CashAndEquivalents,
        Self::SharesOutstanding,
    ];

    /// Returns true for flow metrics, which accumulate over the fiscal year
    /// and are differenced when reported on a cumulative basis.
    #[must_use]
    pub const fn is_flow(self) -> bool {
        matches!(
            self,
            Self::Revenue
                | Self::NetIncome
                | Self::OperatingCashFlow
                | Self::CapitalExpenditures
                | Self::InterestExpense
        )
    }

    /// Returns true for metrics whose cumulative figures must be
    /// non-decreasing within a fiscal year.
    ///
    /// Net income can legitimately shrink year-to-date (a loss quarter),
    /// so only revenue and operating cash flow are checked.
    #[must_use]
    pub const fn is_monotonic(self) -> bool {
        matches!(self, Self::Revenue | Self::OperatingCashFlow)
    }

    /// Reads this metric's value from a [`MetricSet`].
    #[must_use]
    pub const fn get(self, set: &MetricSet) -> Option<f64> {
        match self {
            Self::Revenue => set.revenue,
            Self::NetIncome => set.net_income,
            Self::OperatingCashFlow => set.operating_cash_flow,
            Self::CapitalExpenditures => set.capital_expenditures,
            Self::InterestExpense => set.interest_expense,
            Self::TotalDebt => set.total_debt,
            Self::CashAndEquivalents => set.cash_and_equivalents,
            Self::SharesOutstanding => set.shares_outstanding,
        }
    }

    /// Writes this metric's value into a [`MetricSet`].
    pub const fn set(self, set: &mut MetricSet, value: Option<f64>) {
        match self {
            Self::Revenue => set.revenue = value,
            Self::NetIncome => set.net_income = value,
            Self::OperatingCashFlow => set.operating_cash_flow = value,
            Self::CapitalExpenditures => set.capital_expenditures = value,
            Self::InterestExpense => set.interest_expense = value,
            Self::TotalDebt => set.total_debt = value,
            Self::CashAndEquivalents => set.cash_and_equivalents = value,
            Self::SharesOutstanding => set.shares_outstanding = value,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Revenue => "revenue",
            Self::NetIncome => "net_income",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::CapitalExpenditures => "capital_expenditures",
            Self::InterestExpense => "interest_expense",
            Self::TotalDebt => "total_debt",
            Self::CashAndEquivalents => "cash_and_equivalents",
            Self::SharesOutstanding => "shares_outstanding",
        };
        write!(f, "{name}")
    }
}

/// One period's metric values.
///
/// Every field is explicitly optional: a statement row rarely carries all
/// metrics, and absence must stay distinguishable from zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// Operating cash flow.
    pub operating_cash_flow: Option<f64>,
    /// Capital expenditures.
    pub capital_expenditures: Option<f64>,
    /// Interest expense.
    pub interest_expense: Option<f64>,
    /// Total debt.
    pub total_debt: Option<f64>,
    /// Cash and cash equivalents.
    pub cash_and_equivalents: Option<f64>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,
}

impl MetricSet {
    /// Returns true if no metric carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| m.get(self).is_none())
    }
}

/// One reported financial statement row for a single period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodFact {
    /// Security this fact belongs to.
    pub entity: EntityId,
    /// Fiscal year of the reporting period.
    pub fiscal_year: i32,
    /// Fiscal quarter; `None` for annual-only facts.
    pub fiscal_quarter: Option<FiscalQuarter>,
    /// How the reported figures accumulate.
    pub basis: ReportingBasis,
    /// Date the figures were reported.
    pub report_date: NaiveDate,
    /// ISO currency code of the reported amounts.
    pub currency: String,
    /// Reported metric values.
    pub metrics: MetricSet,
}

impl PeriodFact {
    /// Creates a new fact with an empty metric set.
    #[must_use]
    pub fn new(
        entity: EntityId,
        fiscal_year: i32,
        fiscal_quarter: Option<FiscalQuarter>,
        basis: ReportingBasis,
        report_date: NaiveDate,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            entity,
            fiscal_year,
            fiscal_quarter,
            basis,
            report_date,
            currency: currency.into(),
            metrics: MetricSet::default(),
        }
    }

    /// Sets the metric values.
    #[must_use]
    pub const fn with_metrics(mut self, metrics: MetricSet) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validates structural invariants of this fact.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::Validation`] when the basis and quarter
    /// label disagree or when shares outstanding is negative. A rejected
    /// fact is dropped from the series; it never aborts the whole run.
    pub fn validate(&self) -> Result<()> {
        match (self.basis, self.fiscal_quarter) {
            (ReportingBasis::Annual, Some(q)) => {
                return Err(ValuationError::Validation(format!(
                    "annual fact for FY{} carries quarter label {q}",
                    self.fiscal_year
                )));
            }
            (ReportingBasis::Cumulative | ReportingBasis::SingleQuarter, None) => {
                return Err(ValuationError::Validation(format!(
                    "quarterly fact for FY{} has no quarter label",
                    self.fiscal_year
                )));
            }
            _ => {}
        }
        if let Some(shares) = self.metrics.shares_outstanding {
            if shares < 0.0 {
                return Err(ValuationError::Validation(format!(
                    "negative shares outstanding ({shares}) in FY{}",
                    self.fiscal_year
                )));
            }
        }
        Ok(())
    }
}

/// Market data observed for an entity on a specific date.
///
/// Observations are backfilled lazily by an external collaborator and are
/// immutable once recorded for a date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketObservation {
    /// Security this observation belongs to.
    pub entity: EntityId,
    /// Observation date.
    pub date: NaiveDate,
    /// Closing price.
    pub close: f64,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Shares outstanding on that date.
    pub shares_outstanding: Option<f64>,
}

impl MarketObservation {
    /// Creates a new observation with required fields.
    #[must_use]
    pub const fn new(entity: EntityId, date: NaiveDate, close: f64) -> Self {
        Self {
            entity,
            date,
            close,
            market_cap: None,
            shares_outstanding: None,
        }
    }

    /// Sets the market capitalization.
    #[must_use]
    pub const fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    /// Sets the shares outstanding.
    #[must_use]
    pub const fn with_shares_outstanding(mut self, shares: f64) -> Self {
        self.shares_outstanding = Some(shares);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_entity_id_uppercases() {
        assert_eq!(EntityId::new("aapl").as_str(), "AAPL");
    }

    #[test]
    fn test_metric_roundtrip_through_set() {
        let mut set = MetricSet::default();
        for metric in Metric::ALL {
            assert_eq!(metric.get(&set), None);
            metric.set(&mut set, Some(42.0));
            assert_eq!(metric.get(&set), Some(42.0));
        }
        assert!(!set.is_empty());
    }

    #[test]
    fn test_validate_rejects_basis_quarter_mismatch() {
        let fact = PeriodFact::new(
            EntityId::new("TEST"),
            2024,
            None,
            ReportingBasis::Cumulative,
            date(2024, 4, 30),
            "USD",
        );
        assert!(fact.validate().is_err());

        let fact = PeriodFact::new(
            EntityId::new("TEST"),
            2024,
            Some(FiscalQuarter::Q2),
            ReportingBasis::Annual,
            date(2024, 4, 30),
            "USD",
        );
        assert!(fact.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_shares() {
        let mut fact = PeriodFact::new(
            EntityId::new("TEST"),
            2024,
            Some(FiscalQuarter::Q1),
            ReportingBasis::Cumulative,
            date(2024, 4, 30),
            "USD",
        );
        fact.metrics.shares_outstanding = Some(-1.0);
        assert!(fact.validate().is_err());
    }
}
