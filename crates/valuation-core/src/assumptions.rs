//! Per-run valuation assumptions.
//!
//! A [`ValuationAssumptions`] value is immutable for the duration of one
//! valuation run; parallel entity runs each hold their own snapshot, so no
//! synchronization is required.

use serde::{Deserialize, Serialize};

/// Growth assumption for the explicit DCF projection horizon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rate", rename_all = "snake_case")]
pub enum GrowthAssumption {
    /// One rate applied to every projected year.
    Flat(f64),
    /// Per-year rates; a schedule shorter than the horizon extends its
    /// last rate.
    Schedule(Vec<f64>),
}

impl GrowthAssumption {
    /// Returns the growth rate for projection year `t` (1-based).
    #[must_use]
    pub fn rate_for_year(&self, t: usize) -> f64 {
        match self {
            Self::Flat(rate) => *rate,
            Self::Schedule(rates) => {
                let index = t.saturating_sub(1).min(rates.len().saturating_sub(1));
                rates.get(index).copied().unwrap_or(0.0)
            }
        }
    }
}

impl Default for GrowthAssumption {
    fn default() -> Self {
        Self::Flat(0.10)
    }
}

/// Explicit target capital-structure weights.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapitalWeights {
    /// Equity share of total capital.
    pub equity: f64,
    /// Debt share of total capital.
    pub debt: f64,
}

/// Per-run configuration for one valuation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValuationAssumptions {
    /// Explicit DCF projection horizon in years.
    pub horizon_years: usize,
    /// Growth applied to the base free cash flow over the horizon.
    pub growth: GrowthAssumption,
    /// Perpetuity growth rate beyond the horizon.
    pub terminal_growth: f64,
    /// Risk-free rate for CAPM.
    pub risk_free_rate: f64,
    /// Equity risk premium for CAPM.
    pub equity_risk_premium: f64,
    /// Beta for CAPM; must be supplied or covered by `default_beta`.
    pub beta: Option<f64>,
    /// Fallback beta. Applying it is always recorded as a warning.
    pub default_beta: Option<f64>,
    /// Corporate tax rate for the after-tax cost of debt.
    pub tax_rate: f64,
    /// Overrides the cost of debt derived from interest expense and total
    /// debt.
    pub cost_of_debt_override: Option<f64>,
    /// Explicit capital-structure weights; when absent they are derived
    /// from market capitalization and total debt.
    pub capital_weights: Option<CapitalWeights>,
    /// Number of trailing quarters sampled for the PE percentile grid.
    pub pe_lookback_quarters: usize,
    /// Ceiling above which a trailing PE sample is treated as an outlier
    /// and excluded.
    pub pe_max: f64,
    /// Minimum valid PE samples below which the band is unavailable.
    pub min_history_quarters: usize,
    /// Overrides the projected next-period EPS used for the forward PE.
    pub forward_eps_override: Option<f64>,
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        Self {
            horizon_years: 5,
            growth: GrowthAssumption::default(),
            terminal_growth: 0.02,
            risk_free_rate: 0.04,
            equity_risk_premium: 0.055,
            beta: None,
            default_beta: None,
            tax_rate: 0.21,
            cost_of_debt_override: None,
            capital_weights: None,
            pe_lookback_quarters: 20,
            pe_max: 200.0,
            min_history_quarters: 4,
            forward_eps_override: None,
        }
    }
}
