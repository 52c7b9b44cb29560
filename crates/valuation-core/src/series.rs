//! Reconstructed single-quarter series.
//!
//! This module defines [`SqFact`] (one reconstructed quarter) and
//! [`QuarterSeries`] (the ordered per-entity series with trailing-window
//! helpers used by the valuation engines).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fiscal::FiscalQuarter;
use crate::types::{EntityId, Metric, MetricSet};

/// A financial fact attributable to exactly one fiscal quarter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SqFact {
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Fiscal quarter.
    pub quarter: FiscalQuarter,
    /// Date the underlying figures were reported.
    pub report_date: NaiveDate,
    /// Single-quarter metric values. Point-in-time metrics carry the value
    /// as of the report date; flow metrics carry the quarter's discrete
    /// amount.
    pub metrics: MetricSet,
}

/// A retained annual (full fiscal-year) fact.
///
/// Annual facts are never distributed across quarters; they are kept as
/// distinct records and feed only annual computations such as the
/// historical-growth suggestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnualFact {
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Date the figures were reported.
    pub report_date: NaiveDate,
    /// Full-year metric values.
    pub metrics: MetricSet,
}

/// Ordered sequence of reconstructed single-quarter facts for one entity.
///
/// Keys are `(fiscal_year, quarter)`, so iteration order is chronological
/// and there is at most one fact per key. Missing quarters stay absent;
/// the series never interpolates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuarterSeries {
    entity: EntityId,
    currency: String,
    quarters: BTreeMap<(i32, FiscalQuarter), SqFact>,
    annuals: BTreeMap<i32, AnnualFact>,
}

impl QuarterSeries {
    /// Creates an empty series for an entity reporting in `currency`.
    #[must_use]
    pub fn new(entity: EntityId, currency: impl Into<String>) -> Self {
        Self {
            entity,
            currency: currency.into(),
            quarters: BTreeMap::new(),
            annuals: BTreeMap::new(),
        }
    }

    /// Returns the entity this series belongs to.
    #[must_use]
    pub const fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Returns the series currency.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Inserts a quarter, returning the fact it replaced (a restatement)
    /// if the `(fiscal_year, quarter)` key was already present.
    pub fn insert(&mut self, fact: SqFact) -> Option<SqFact> {
        self.quarters.insert((fact.fiscal_year, fact.quarter), fact)
    }

    /// Inserts an annual fact, returning any fact it replaced.
    pub fn insert_annual(&mut self, fact: AnnualFact) -> Option<AnnualFact> {
        self.annuals.insert(fact.fiscal_year, fact)
    }

    /// Looks up a quarter by key.
    #[must_use]
    pub fn get(&self, fiscal_year: i32, quarter: FiscalQuarter) -> Option<&SqFact> {
        self.quarters.get(&(fiscal_year, quarter))
    }

    /// Iterates quarters in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &SqFact> {
        self.quarters.values()
    }

    /// Iterates retained annual facts in chronological order.
    pub fn annuals(&self) -> impl Iterator<Item = &AnnualFact> {
        self.annuals.values()
    }

    /// Returns the number of reconstructed quarters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quarters.len()
    }

    /// Returns true if no quarters were reconstructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quarters.is_empty()
    }

    /// Returns the most recent quarter.
    #[must_use]
    pub fn last(&self) -> Option<&SqFact> {
        self.quarters.values().next_back()
    }

    /// Returns the last `n` quarters ending at the most recent one, only if
    /// they are strictly consecutive. A gap anywhere in the window makes
    /// the trailing window unavailable rather than approximate.
    #[must_use]
    pub fn trailing(&self, n: usize) -> Option<Vec<&SqFact>> {
        let last = self.last()?;
        self.trailing_ending(last.fiscal_year, last.quarter, n)
    }

    /// Returns the `n` consecutive quarters ending at `(fiscal_year,
    /// quarter)` inclusive, oldest first, or `None` on any gap.
    #[must_use]
    pub fn trailing_ending(
        &self,
        fiscal_year: i32,
        quarter: FiscalQuarter,
        n: usize,
    ) -> Option<Vec<&SqFact>> {
        let mut window = Vec::with_capacity(n);
        let mut key = (fiscal_year, quarter);
        for _ in 0..n {
            window.push(self.quarters.get(&key)?);
            key = FiscalQuarter::prev_key(key.0, key.1);
        }
        window.reverse();
        Some(window)
    }

    /// Sums a flow metric over the four consecutive quarters ending at the
    /// most recent one (trailing twelve months).
    ///
    /// Returns `None` when the window has a gap or any quarter lacks the
    /// metric.
    #[must_use]
    pub fn ttm(&self, metric: Metric) -> Option<f64> {
        let last = self.last()?;
        self.ttm_ending(last.fiscal_year, last.quarter, metric)
    }

    /// Sums a flow metric over the four consecutive quarters ending at
    /// `(fiscal_year, quarter)` inclusive.
    #[must_use]
    pub fn ttm_ending(
        &self,
        fiscal_year: i32,
        quarter: FiscalQuarter,
        metric: Metric,
    ) -> Option<f64> {
        let window = self.trailing_ending(fiscal_year, quarter, 4)?;
        window
            .iter()
            .map(|q| metric.get(&q.metrics))
            .sum::<Option<f64>>()
    }

    /// Year-over-year growth of the trailing-twelve-month sum of a metric:
    /// the TTM ending at the latest quarter against the TTM ending four
    /// quarters earlier.
    ///
    /// Returns `None` when either window is unavailable or the prior TTM
    /// is zero.
    #[must_use]
    pub fn ttm_yoy_growth(&self, metric: Metric) -> Option<f64> {
        let last = self.last()?;
        let current = self.ttm_ending(last.fiscal_year, last.quarter, metric)?;
        let (prior_year, prior_quarter) = (last.fiscal_year - 1, last.quarter);
        let prior = self.ttm_ending(prior_year, prior_quarter, metric)?;
        if prior == 0.0 {
            return None;
        }
        Some((current - prior) / prior.abs())
    }

    /// Returns the most recent available value of a point-in-time metric,
    /// scanning backwards from the latest quarter.
    #[must_use]
    pub fn latest_point_in_time(&self, metric: Metric) -> Option<f64> {
        self.quarters
            .values()
            .rev()
            .find_map(|q| metric.get(&q.metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quarter(year: i32, q: FiscalQuarter, revenue: f64) -> SqFact {
        let mut metrics = MetricSet::default();
        metrics.revenue = Some(revenue);
        SqFact {
            fiscal_year: year,
            quarter: q,
            report_date: date(year, u32::from(q.number()) * 3, 28),
            metrics,
        }
    }

    fn series_of(quarters: Vec<SqFact>) -> QuarterSeries {
        let mut series = QuarterSeries::new(EntityId::new("TEST"), "USD");
        for q in quarters {
            series.insert(q);
        }
        series
    }

    #[test]
    fn test_iteration_is_chronological() {
        let series = series_of(vec![
            quarter(2024, FiscalQuarter::Q2, 2.0),
            quarter(2023, FiscalQuarter::Q4, 4.0),
            quarter(2024, FiscalQuarter::Q1, 1.0),
        ]);
        let revenues: Vec<f64> = series.iter().filter_map(|q| q.metrics.revenue).collect();
        assert_eq!(revenues, vec![4.0, 1.0, 2.0]);
    }

    #[test]
    fn test_ttm_spans_year_boundary() {
        let series = series_of(vec![
            quarter(2023, FiscalQuarter::Q3, 10.0),
            quarter(2023, FiscalQuarter::Q4, 20.0),
            quarter(2024, FiscalQuarter::Q1, 30.0),
            quarter(2024, FiscalQuarter::Q2, 40.0),
        ]);
        assert_eq!(series.ttm(Metric::Revenue), Some(100.0));
    }

    #[test]
    fn test_ttm_unavailable_on_gap() {
        // 2023 Q4 is missing, so the trailing window has a hole.
        let series = series_of(vec![
            quarter(2023, FiscalQuarter::Q3, 10.0),
            quarter(2024, FiscalQuarter::Q1, 30.0),
            quarter(2024, FiscalQuarter::Q2, 40.0),
            quarter(2024, FiscalQuarter::Q3, 50.0),
        ]);
        assert_eq!(series.ttm(Metric::Revenue), None);
    }

    #[test]
    fn test_ttm_yoy_growth() {
        let mut quarters = Vec::new();
        // FY2023: 10 each quarter, FY2024: 12 each quarter.
        for q in FiscalQuarter::ALL {
            quarters.push(quarter(2023, q, 10.0));
        }
        for q in FiscalQuarter::ALL {
            quarters.push(quarter(2024, q, 12.0));
        }
        let series = series_of(quarters);
        let growth = series.ttm_yoy_growth(Metric::Revenue).unwrap();
        assert!((growth - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_insert_returns_restated_fact() {
        let mut series = series_of(vec![quarter(2024, FiscalQuarter::Q1, 10.0)]);
        let replaced = series.insert(quarter(2024, FiscalQuarter::Q1, 11.0));
        assert_eq!(replaced.unwrap().metrics.revenue, Some(10.0));
        assert_eq!(series.len(), 1);
        assert_eq!(
            series
                .get(2024, FiscalQuarter::Q1)
                .unwrap()
                .metrics
                .revenue,
            Some(11.0)
        );
    }
}
