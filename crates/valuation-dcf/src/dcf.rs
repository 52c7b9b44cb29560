//! Discounted-cash-flow intrinsic valuation.
//!
//! Base free cash flow is the trailing-twelve-month operating cash flow
//! less capital expenditures, compounded over the explicit horizon,
//! discounted at the WACC, and capped with a Gordon-growth terminal value.

use tracing::debug;
use valuation_core::{
    DcfReport, Metric, QuarterSeries, Result, ValuationAssumptions, ValuationError,
};

/// Bounds outside which a historical CAGR is considered unreliable and
/// not suggested (matches the sanity window applied to reported growth).
const GROWTH_SUGGESTION_BOUNDS: (f64, f64) = (-0.20, 0.50);

/// Computes the DCF intrinsic value for one entity.
///
/// `shares_outstanding` is the fallback when the series itself carries no
/// share count (typically the latest market observation's figure).
///
/// # Errors
///
/// - [`ValuationError::InsufficientHistory`] when fewer than four valid
///   consecutive trailing quarters exist, leaving the base FCF
///   undetermined. Partial quarters are never estimated from.
/// - [`ValuationError::Domain`] when the discount rate does not exceed the
///   terminal growth rate, which makes the terminal value divergent.
pub fn compute_dcf(
    series: &QuarterSeries,
    discount_rate: f64,
    assumptions: &ValuationAssumptions,
    shares_outstanding: Option<f64>,
) -> Result<DcfReport> {
    if discount_rate <= assumptions.terminal_growth {
        return Err(ValuationError::Domain {
            discount_rate,
            terminal_growth: assumptions.terminal_growth,
        });
    }

    let operating_cash_flow =
        series
            .ttm(Metric::OperatingCashFlow)
            .ok_or(ValuationError::InsufficientHistory {
                required: 4,
                available: available_trailing(series, Metric::OperatingCashFlow),
            })?;
    // Capex is reported with inconsistent sign conventions; spend is
    // always a subtraction here. Missing capex is treated as zero spend.
    let capital_expenditures = series
        .ttm(Metric::CapitalExpenditures)
        .map_or(0.0, f64::abs);
    let base_fcf = operating_cash_flow - capital_expenditures;

    let mut projected_fcf = Vec::with_capacity(assumptions.horizon_years);
    let mut discounted_fcf = Vec::with_capacity(assumptions.horizon_years);
    let mut fcf = base_fcf;
    for t in 1..=assumptions.horizon_years {
        fcf *= 1.0 + assumptions.growth.rate_for_year(t);
        projected_fcf.push(fcf);
        discounted_fcf.push(fcf / (1.0 + discount_rate).powi(t as i32));
    }

    let final_fcf = projected_fcf.last().copied().unwrap_or(base_fcf);
    let terminal_value = final_fcf * (1.0 + assumptions.terminal_growth)
        / (discount_rate - assumptions.terminal_growth);
    let terminal_value_pv =
        terminal_value / (1.0 + discount_rate).powi(assumptions.horizon_years as i32);

    let enterprise_value = discounted_fcf.iter().sum::<f64>() + terminal_value_pv;
    let net_debt = series.latest_point_in_time(Metric::TotalDebt).unwrap_or(0.0)
        - series
            .latest_point_in_time(Metric::CashAndEquivalents)
            .unwrap_or(0.0);
    let equity_value = enterprise_value - net_debt;

    let shares = series
        .latest_point_in_time(Metric::SharesOutstanding)
        .or(shares_outstanding)
        .filter(|s| *s > 0.0);
    let intrinsic_value_per_share = shares.map(|s| equity_value / s);

    debug!(
        entity = %series.entity(),
        base_fcf,
        enterprise_value,
        equity_value,
        "computed DCF valuation"
    );
    Ok(DcfReport {
        discount_rate,
        base_fcf,
        projected_fcf,
        discounted_fcf,
        terminal_value,
        terminal_value_pv,
        enterprise_value,
        net_debt,
        equity_value,
        intrinsic_value_per_share,
    })
}

/// Suggests a growth rate from the CAGR of annual free cash flow over up
/// to the last five retained annual records.
///
/// Returns `None` with fewer than two usable annual FCF figures, when an
/// endpoint is not positive, or when the CAGR falls outside the sanity
/// bounds.
#[must_use]
pub fn suggest_growth_rate(series: &QuarterSeries) -> Option<f64> {
    let fcf: Vec<f64> = series
        .annuals()
        .filter_map(|annual| {
            let ocf = annual.metrics.operating_cash_flow?;
            let capex = annual.metrics.capital_expenditures.map_or(0.0, f64::abs);
            Some(ocf - capex)
        })
        .collect();
    let window: Vec<f64> = fcf.iter().rev().take(5).rev().copied().collect();
    if window.len() < 2 {
        return None;
    }
    let (first, last) = (window[0], window[window.len() - 1]);
    if first <= 0.0 || last <= 0.0 {
        return None;
    }
    let years = (window.len() - 1) as f64;
    let cagr = (last / first).powf(1.0 / years) - 1.0;
    let (low, high) = GROWTH_SUGGESTION_BOUNDS;
    if cagr <= low || cagr >= high {
        return None;
    }
    Some(cagr)
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
