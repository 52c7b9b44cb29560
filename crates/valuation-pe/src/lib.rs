#![forbid(unsafe_code)]

//! Historical PE-band statistical valuation engine.
//!
//! For each reconstructed quarter the engine derives trailing-twelve-month
//! EPS, matches the closing price as of the report date (backward), and
//! builds the historical distribution of trailing PE as a percentile grid.
//! The current PE is then placed against that grid. Periods with
//! non-positive TTM EPS are excluded from the sample, never treated as
//! zero or infinity, and too few valid samples makes the whole band
//! unavailable rather than approximate.

use tracing::debug;
use valuation_core::{
    DataQualityWarning, MarketObservation, Metric, PeBandReport, PeBandVerdict, PercentileGrid,
    QuarterSeries, Result, ValuationAssumptions, ValuationError,
};

/// Computes the PE-band report for one entity.
///
/// `history` must be sorted ascending by date, as the [`MarketData`]
/// contract guarantees. Report dates with no observation on or before them
/// are skipped with a warning.
///
/// # Errors
///
/// - [`ValuationError::MissingMarketData`] when there are no observations
///   at all, or no shares-outstanding figure to derive EPS from.
/// - [`ValuationError::InsufficientHistory`] when fewer than the configured
///   minimum of valid PE samples exist, or the current TTM window has a gap.
/// - [`ValuationError::NonPositiveEarnings`] when the current TTM EPS is
///   not positive, making the current PE undefined.
///
/// [`MarketData`]: valuation_core::MarketData
pub fn compute_pe_band(
    series: &QuarterSeries,
    history: &[MarketObservation],
    assumptions: &ValuationAssumptions,
    warnings: &mut Vec<DataQualityWarning>,
) -> Result<PeBandReport> {
    let latest_observation = history.last().ok_or(ValuationError::MissingMarketData)?;

    // Historical trailing-PE sample over the lookback window.
    let quarters: Vec<_> = series.iter().collect();
    let lookback = quarters
        .len()
        .saturating_sub(assumptions.pe_lookback_quarters);
    let mut sample = Vec::new();
    for quarter in &quarters[lookback..] {
        let Some(ttm_earnings) =
            series.ttm_ending(quarter.fiscal_year, quarter.quarter, Metric::NetIncome)
        else {
            continue;
        };
        let Some(price) = price_as_of(history, quarter.report_date) else {
            warnings.push(DataQualityWarning::MissingObservation {
                report_date: quarter.report_date,
            });
            continue;
        };
        let Some(shares) = shares_for(series, quarter.metrics.shares_outstanding, history) else {
            continue;
        };
        let eps_ttm = ttm_earnings / shares;
        if eps_ttm <= 0.0 {
            // PE is undefined for loss periods; exclude, don't clamp.
            continue;
        }
        let pe = price / eps_ttm;
        if pe > assumptions.pe_max {
            continue;
        }
        sample.push(pe);
    }

    // A percentile grid needs at least one sample, whatever minimum is
    // configured.
    let min_samples = assumptions.min_history_quarters.max(1);
    if sample.len() < min_samples {
        return Err(ValuationError::InsufficientHistory {
            required: min_samples,
            available: sample.len(),
        });
    }

    let mut sorted = sample.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let thresholds = PercentileGrid {
        p10: percentile(&sorted, 10.0),
        p25: percentile(&sorted, 25.0),
        p50: percentile(&sorted, 50.0),
        p75: percentile(&sorted, 75.0),
        p90: percentile(&sorted, 90.0),
    };

    // Current PE uses the most recent price and the latest TTM EPS.
    let ttm_earnings = series
        .ttm(Metric::NetIncome)
        .ok_or(ValuationError::InsufficientHistory {
            required: 4,
            available: available_trailing(series, Metric::NetIncome),
        })?;
    let shares = shares_for(
        series,
        series.latest_point_in_time(Metric::SharesOutstanding),
        history,
    )
    .ok_or(ValuationError::MissingMarketData)?;
    let current_eps_ttm = ttm_earnings / shares;
    if current_eps_ttm <= 0.0 {
        return Err(ValuationError::NonPositiveEarnings);
    }
    let current_pe = latest_observation.close / current_eps_ttm;
    let current_percentile = percentile_rank(&sorted, current_pe);

    // Forward PE from the projected next-period EPS: an explicit override
    // wins, else the TTM EPS grown by its own year-over-year rate.
    let earnings_growth = series.ttm_yoy_growth(Metric::NetIncome);
    let forward_eps = assumptions
        .forward_eps_override
        .or_else(|| earnings_growth.map(|g| current_eps_ttm * (1.0 + g)));
    let forward_pe = forward_eps
        .filter(|eps| *eps > 0.0)
        .map(|eps| latest_observation.close / eps);
    let peg_ratio = earnings_growth
        .filter(|g| *g > 0.0)
        .map(|g| current_pe / (g * 100.0));

    let verdict = place(current_pe, &thresholds);
    debug!(
        entity = %series.entity(),
        samples = sorted.len(),
        current_pe,
        %verdict,
        "computed PE band"
    );

    Ok(PeBandReport {
        thresholds,
        sample_count: sorted.len(),
        current_pe,
        current_percentile,
        forward_pe,
        peg_ratio,
        verdict,
    })
}

/// Latest closing price observed on or before `date` (as-of backward).
fn price_as_of(history: &[MarketObservation], date: chrono::NaiveDate) -> Option<f64> {
    history
        .iter()
        .rev()
        .find(|obs| obs.date <= date)
        .map(|obs| obs.close)
}

/// Shares outstanding from the quarter itself, the series, or the most
/// recent market observation carrying one. Non-positive counts are
/// unusable for EPS.
fn shares_for(
    series: &QuarterSeries,
    from_quarter: Option<f64>,
    history: &[MarketObservation],
) -> Option<f64> {
    from_quarter
        .or_else(|| series.latest_point_in_time(Metric::SharesOutstanding))
        .or_else(|| history.iter().rev().find_map(|obs| obs.shares_outstanding))
        .filter(|shares| *shares > 0.0)
}

/// Number of consecutive quarters ending at the latest one that carry
/// `metric`, capped at 4.
fn available_trailing(series: &QuarterSeries, metric: Metric) -> usize {
    (1..=4)
        .rev()
        .find(|n| {
            series.trailing(*n).is_some_and(|quarters| {
                quarters.iter().all(|q| metric.get(&q.metrics).is_some())
            })
        })
        .unwrap_or(0)
}

/// Linear-interpolation percentile of an ascending-sorted non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        return sorted[low];
    }
    let weight = rank - low as f64;
    sorted[low] * (1.0 - weight) + sorted[high] * weight
}

/// Percentile rank (0-100): share of samples at or below `value`.
fn percentile_rank(sorted: &[f64], value: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let below = sorted.iter().filter(|s| **s <= value).count();
    below as f64 / sorted.len() as f64 * 100.0
}

/// Places a PE against the historical grid.
fn place(pe: f64, grid: &PercentileGrid) -> PeBandVerdict {
    if pe < grid.p10 {
        PeBandVerdict::DeepDiscount
    } else if pe < grid.p25 {
        PeBandVerdict::Discount
    } else if pe < grid.p75 {
        PeBandVerdict::Fair
    } else if pe < grid.p90 {
        PeBandVerdict::Premium
    } else {
        PeBandVerdict::ExtremePremium
    }
}
