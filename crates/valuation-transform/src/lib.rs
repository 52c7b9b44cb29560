#![forbid(unsafe_code)]

//! Single-quarter reconstruction of cumulative financial statements.
//!
//! Statements reported year-to-date (common for CN/HK listings) are turned
//! into discrete single-quarter facts: quarter q's flow metrics are
//! `cumulative(q) - cumulative(q-1)`, quarter 1 passes through, and the
//! fiscal-year boundary is never crossed. Point-in-time balance-sheet
//! metrics are never differenced. Underivable quarters stay absent with a
//! warning; the transformer never interpolates or carries forward, since a
//! synthesized quarter would corrupt every downstream growth rate.

use std::collections::BTreeMap;

use tracing::debug;
use valuation_core::{
    AnnualFact, DataQualityWarning, EntityId, FiscalQuarter, Metric, MetricSet, PeriodFact,
    QuarterSeries, ReportingBasis, SqFact,
};

/// A reconstructed series together with the warnings collected while
/// building it.
#[derive(Clone, Debug, PartialEq)]
pub struct Transformed {
    /// The reconstructed single-quarter series.
    pub series: QuarterSeries,
    /// Data-quality warnings, in discovery order.
    pub warnings: Vec<DataQualityWarning>,
}

/// Reconstructs a [`QuarterSeries`] from an entity's reported period facts.
///
/// The input is processed in order, so a restated fact appearing later
/// overwrites the earlier one for the same
/// `(fiscal_year, quarter, basis)` key. Malformed facts are dropped with a
/// warning; they never abort the transformation. The output is a pure
/// function of the input: re-running on an unchanged slice yields an
/// identical series.
#[must_use]
pub fn reconstruct(entity: &EntityId, facts: &[PeriodFact]) -> Transformed {
    let mut warnings = Vec::new();

    // Series currency is set by the first fact that survives validation;
    // later facts in another currency are excluded, not coerced.
    let currency = facts
        .iter()
        .find(|f| f.entity == *entity && f.validate().is_ok())
        .map(|f| f.currency.clone())
        .unwrap_or_default();
    let mut series = QuarterSeries::new(entity.clone(), currency.clone());

    let mut cumulative: BTreeMap<(i32, FiscalQuarter), &PeriodFact> = BTreeMap::new();
    let mut single: BTreeMap<(i32, FiscalQuarter), &PeriodFact> = BTreeMap::new();
    let mut annual: BTreeMap<i32, &PeriodFact> = BTreeMap::new();

    for fact in facts {
        if fact.entity != *entity {
            warnings.push(DataQualityWarning::RejectedFact {
                fiscal_year: fact.fiscal_year,
                detail: format!("fact belongs to {}, not {entity}", fact.entity),
            });
            continue;
        }
        if let Err(err) = fact.validate() {
            warnings.push(DataQualityWarning::RejectedFact {
                fiscal_year: fact.fiscal_year,
                detail: err.to_string(),
            });
            continue;
        }
        if fact.currency != currency {
            warnings.push(DataQualityWarning::CurrencyMismatch {
                expected: currency.clone(),
                found: fact.currency.clone(),
                fiscal_year: fact.fiscal_year,
            });
            continue;
        }

        match fact.basis {
            ReportingBasis::Cumulative => {
                let Some(quarter) = fact.fiscal_quarter else {
                    continue;
                };
                if cumulative
                    .insert((fact.fiscal_year, quarter), fact)
                    .is_some()
                {
                    warnings.push(DataQualityWarning::QuarterRestated {
                        fiscal_year: fact.fiscal_year,
                        quarter,
                    });
                }
            }
            ReportingBasis::SingleQuarter => {
                let Some(quarter) = fact.fiscal_quarter else {
                    continue;
                };
                if single.insert((fact.fiscal_year, quarter), fact).is_some() {
                    warnings.push(DataQualityWarning::QuarterRestated {
                        fiscal_year: fact.fiscal_year,
                        quarter,
                    });
                }
            }
            ReportingBasis::Annual => {
                annual.insert(fact.fiscal_year, fact);
            }
        }
    }

    // Difference cumulative facts into single quarters. Q1 passes through;
    // a quarter whose predecessor is absent stays absent.
    for (&(year, quarter), fact) in &cumulative {
        let metrics = match quarter.prev_in_year() {
            None => fact.metrics,
            Some(prev_quarter) => match cumulative.get(&(year, prev_quarter)) {
                None => {
                    warnings.push(DataQualityWarning::MissingPriorQuarter {
                        fiscal_year: year,
                        quarter,
                    });
                    continue;
                }
                Some(prior) => difference(fact, prior, year, quarter, &mut warnings),
            },
        };
        if metrics.is_empty() {
            continue;
        }
        series.insert(SqFact {
            fiscal_year: year,
            quarter,
            report_date: fact.report_date,
            metrics,
        });
    }

    // Facts already reported single-quarter pass through unchanged. Where
    // both bases exist for one key, the single-quarter figure supersedes
    // the derived one.
    for (&(year, quarter), fact) in &single {
        let replaced = series.insert(SqFact {
            fiscal_year: year,
            quarter,
            report_date: fact.report_date,
            metrics: fact.metrics,
        });
        if replaced.is_some() {
            warnings.push(DataQualityWarning::QuarterRestated {
                fiscal_year: year,
                quarter,
            });
        }
    }

    // Annual facts are retained as distinct records, never distributed
    // across quarters.
    for (&year, fact) in &annual {
        series.insert_annual(AnnualFact {
            fiscal_year: year,
            report_date: fact.report_date,
            metrics: fact.metrics,
        });
    }

    debug!(
        entity = %entity,
        quarters = series.len(),
        warnings = warnings.len(),
        "reconstructed single-quarter series"
    );
    Transformed { series, warnings }
}

/// Computes quarter q's metrics from cumulative facts for q and q-1.
///
/// Flow metrics are differenced per metric: a metric missing on either
/// side is absent for the quarter. Point-in-time metrics take the current
/// fact's value as of its report date.
fn difference(
    current: &PeriodFact,
    prior: &PeriodFact,
    year: i32,
    quarter: FiscalQuarter,
    warnings: &mut Vec<DataQualityWarning>,
) -> MetricSet {
    let mut out = MetricSet::default();
    for metric in Metric::ALL {
        let value = if metric.is_flow() {
            match (metric.get(&current.metrics), metric.get(&prior.metrics)) {
                (Some(cur), Some(prev)) => {
                    if metric.is_monotonic() && cur < prev {
                        warnings.push(DataQualityWarning::NonMonotonicCumulative {
                            metric,
                            fiscal_year: year,
                            quarter,
                        });
                    }
                    Some(cur - prev)
                }
                _ => None,
            }
        } else {
            metric.get(&current.metrics)
        };
        metric.set(&mut out, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entity() -> EntityId {
        EntityId::new("TEST")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cumulative_fact(year: i32, q: u8, revenue: f64) -> PeriodFact {
        let quarter = FiscalQuarter::try_from(q).unwrap();
        let mut fact = PeriodFact::new(
            entity(),
            year,
            Some(quarter),
            ReportingBasis::Cumulative,
            date(year, u32::from(q) * 3, 28),
            "USD",
        );
        fact.metrics.revenue = Some(revenue);
        fact
    }

    #[test]
    fn test_cumulative_reconstruction_is_exact() {
        let facts = vec![
            cumulative_fact(2024, 1, 100.0),
            cumulative_fact(2024, 2, 220.0),
            cumulative_fact(2024, 3, 345.0),
            cumulative_fact(2024, 4, 480.0),
        ];
        let out = reconstruct(&entity(), &facts);
        let revenues: Vec<f64> = out
            .series
            .iter()
            .filter_map(|q| q.metrics.revenue)
            .collect();
        assert_eq!(revenues, vec![100.0, 120.0, 125.0, 135.0]);
        assert_eq!(revenues.iter().sum::<f64>(), 480.0);
        assert_eq!(out.series.ttm(Metric::Revenue), Some(480.0));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_q1_never_subtracts_prior_year_q4() {
        let facts = vec![
            cumulative_fact(2023, 4, 480.0),
            cumulative_fact(2024, 1, 90.0),
        ];
        let out = reconstruct(&entity(), &facts);
        let q1 = out.series.get(2024, FiscalQuarter::Q1).unwrap();
        assert_eq!(q1.metrics.revenue, Some(90.0));
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let facts = vec![
            cumulative_fact(2024, 1, 100.0),
            cumulative_fact(2024, 2, 220.0),
            cumulative_fact(2024, 3, 345.0),
        ];
        let first = reconstruct(&entity(), &facts);
        let second = reconstruct(&entity(), &facts);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_prior_quarter_leaves_quarter_absent() {
        // Q2 is absent: Q3 cannot be derived even though Q1 and Q3 exist.
        let facts = vec![
            cumulative_fact(2024, 1, 100.0),
            cumulative_fact(2024, 3, 345.0),
        ];
        let out = reconstruct(&entity(), &facts);
        assert!(out.series.get(2024, FiscalQuarter::Q1).is_some());
        assert!(out.series.get(2024, FiscalQuarter::Q2).is_none());
        assert!(out.series.get(2024, FiscalQuarter::Q3).is_none());
        assert_eq!(
            out.warnings,
            vec![DataQualityWarning::MissingPriorQuarter {
                fiscal_year: 2024,
                quarter: FiscalQuarter::Q3,
            }]
        );
    }

    #[test]
    fn test_restatement_overwrites_affected_quarters_only() {
        let mut facts = vec![
            cumulative_fact(2023, 1, 50.0),
            cumulative_fact(2024, 1, 100.0),
            cumulative_fact(2024, 2, 220.0),
            cumulative_fact(2024, 3, 345.0),
        ];
        let before = reconstruct(&entity(), &facts);

        // Restated Q2 cumulative figure arrives later in the feed.
        facts.push(cumulative_fact(2024, 2, 230.0));
        let after = reconstruct(&entity(), &facts);

        // Q2 and Q3 move; Q1 and the prior year do not.
        let q = |s: &Transformed, y, q| s.series.get(y, q).unwrap().metrics.revenue.unwrap();
        assert_eq!(q(&after, 2024, FiscalQuarter::Q2), 130.0);
        assert_eq!(q(&after, 2024, FiscalQuarter::Q3), 115.0);
        assert_eq!(
            q(&after, 2024, FiscalQuarter::Q1),
            q(&before, 2024, FiscalQuarter::Q1)
        );
        assert_eq!(
            q(&after, 2023, FiscalQuarter::Q1),
            q(&before, 2023, FiscalQuarter::Q1)
        );
        assert!(after.warnings.contains(&DataQualityWarning::QuarterRestated {
            fiscal_year: 2024,
            quarter: FiscalQuarter::Q2,
        }));
    }

    #[test]
    fn test_monotonicity_violation_is_flagged_not_corrected() {
        let facts = vec![
            cumulative_fact(2024, 1, 100.0),
            cumulative_fact(2024, 2, 80.0),
        ];
        let out = reconstruct(&entity(), &facts);
        // The differenced value stays as reported.
        assert_eq!(
            out.series
                .get(2024, FiscalQuarter::Q2)
                .unwrap()
                .metrics
                .revenue,
            Some(-20.0)
        );
        assert_eq!(
            out.warnings,
            vec![DataQualityWarning::NonMonotonicCumulative {
                metric: Metric::Revenue,
                fiscal_year: 2024,
                quarter: FiscalQuarter::Q2,
            }]
        );
    }

    #[test]
    fn test_point_in_time_metrics_are_never_differenced() {
        let mut q1 = cumulative_fact(2024, 1, 100.0);
        q1.metrics.total_debt = Some(500.0);
        let mut q2 = cumulative_fact(2024, 2, 220.0);
        q2.metrics.total_debt = Some(520.0);

        let out = reconstruct(&entity(), &[q1, q2]);
        let sq2 = out.series.get(2024, FiscalQuarter::Q2).unwrap();
        assert_eq!(sq2.metrics.total_debt, Some(520.0));
        assert_eq!(sq2.metrics.revenue, Some(120.0));
    }

    #[test]
    fn test_currency_mismatch_excludes_fact_with_warning() {
        let mut hkd = cumulative_fact(2024, 2, 220.0);
        hkd.currency = "HKD".to_string();
        let facts = vec![cumulative_fact(2024, 1, 100.0), hkd];

        let out = reconstruct(&entity(), &facts);
        assert!(out.series.get(2024, FiscalQuarter::Q2).is_none());
        assert_eq!(
            out.warnings,
            vec![DataQualityWarning::CurrencyMismatch {
                expected: "USD".to_string(),
                found: "HKD".to_string(),
                fiscal_year: 2024,
            }]
        );
    }

    #[test]
    fn test_malformed_fact_is_rejected_alone() {
        let mut bad = cumulative_fact(2024, 2, 220.0);
        bad.metrics.shares_outstanding = Some(-10.0);
        let facts = vec![cumulative_fact(2024, 1, 100.0), bad];

        let out = reconstruct(&entity(), &facts);
        assert_eq!(out.series.len(), 1);
        assert!(matches!(
            out.warnings.as_slice(),
            [DataQualityWarning::RejectedFact {
                fiscal_year: 2024,
                ..
            }]
        ));
    }

    #[test]
    fn test_single_quarter_basis_passes_through() {
        let mut fact = PeriodFact::new(
            entity(),
            2024,
            Some(FiscalQuarter::Q2),
            ReportingBasis::SingleQuarter,
            date(2024, 6, 28),
            "USD",
        );
        fact.metrics.revenue = Some(120.0);

        let out = reconstruct(&entity(), &[fact]);
        assert_eq!(
            out.series
                .get(2024, FiscalQuarter::Q2)
                .unwrap()
                .metrics
                .revenue,
            Some(120.0)
        );
    }

    #[test]
    fn test_annual_fact_is_retained_not_distributed() {
        let mut fy = PeriodFact::new(
            entity(),
            2024,
            None,
            ReportingBasis::Annual,
            date(2025, 2, 15),
            "USD",
        );
        fy.metrics.revenue = Some(480.0);

        let out = reconstruct(&entity(), &[fy]);
        assert!(out.series.is_empty());
        let annuals: Vec<_> = out.series.annuals().collect();
        assert_eq!(annuals.len(), 1);
        assert_eq!(annuals[0].metrics.revenue, Some(480.0));
    }

    #[test]
    fn test_partial_metric_absence_is_per_metric() {
        let mut q1 = cumulative_fact(2024, 1, 100.0);
        q1.metrics.net_income = Some(10.0);
        // Q2 reports revenue but no net income: only net income is absent.
        let q2 = cumulative_fact(2024, 2, 220.0);

        let out = reconstruct(&entity(), &[q1, q2]);
        let sq2 = out.series.get(2024, FiscalQuarter::Q2).unwrap();
        assert_eq!(sq2.metrics.revenue, Some(120.0));
        assert_eq!(sq2.metrics.net_income, None);
    }
}
