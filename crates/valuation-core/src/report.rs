//! Valuation output types.
//!
//! [`ValuationResult`] is the structure exported to the reporting layer.
//! Every field is present even when a sub-computation failed: an
//! unavailable PE band or DCF is itself a serialized value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::outcome::{Computed, DataQualityWarning};
use crate::types::EntityId;

/// Percentile thresholds of the historical trailing-PE distribution.
///
/// Thresholds are non-decreasing by construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentileGrid {
    /// 10th percentile.
    pub p10: f64,
    /// 25th percentile.
    pub p25: f64,
    /// 50th percentile (median).
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 90th percentile.
    pub p90: f64,
}

/// Qualitative placement of the current PE against the historical grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeBandVerdict {
    /// Below the 10th percentile.
    DeepDiscount,
    /// Between the 10th and 25th percentiles.
    Discount,
    /// Between the 25th and 75th percentiles.
    Fair,
    /// Between the 75th and 90th percentiles.
    Premium,
    /// At or above the 90th percentile.
    ExtremePremium,
}

impl fmt::Display for PeBandVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DeepDiscount => "deep discount",
            Self::Discount => "discount",
            Self::Fair => "fair",
            Self::Premium => "premium",
            Self::ExtremePremium => "extreme premium",
        };
        write!(f, "{label}")
    }
}

/// Output of the PE band engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeBandReport {
    /// Historical percentile thresholds over the lookback window.
    pub thresholds: PercentileGrid,
    /// Number of valid trailing-PE samples behind the grid.
    pub sample_count: usize,
    /// Current PE: latest price over latest trailing-twelve-month EPS.
    pub current_pe: f64,
    /// Percentile rank (0-100) of the current PE within the sample.
    pub current_percentile: f64,
    /// Forward PE from the projected next-period EPS, when derivable.
    pub forward_pe: Option<f64>,
    /// PEG ratio: current PE over TTM-EPS growth (in percent), when
    /// growth is positive.
    pub peg_ratio: Option<f64>,
    /// Band placement of the current PE.
    pub verdict: PeBandVerdict,
}

/// Output of the WACC calculator, with every intermediate retained.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaccBreakdown {
    /// Cost of equity via CAPM.
    pub cost_of_equity: f64,
    /// After-tax cost of debt.
    pub cost_of_debt_after_tax: f64,
    /// Equity weight in the capital structure.
    pub weight_equity: f64,
    /// Debt weight in the capital structure.
    pub weight_debt: f64,
    /// The blended discount rate.
    pub wacc: f64,
    /// Beta actually used.
    pub beta_used: f64,
    /// True when `beta_used` came from the default policy rather than the
    /// supplied assumption.
    pub beta_defaulted: bool,
}

/// Output of the DCF engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DcfReport {
    /// Discount rate applied (the WACC).
    pub discount_rate: f64,
    /// Base trailing-twelve-month free cash flow.
    pub base_fcf: f64,
    /// Projected free cash flows for years 1..=horizon.
    pub projected_fcf: Vec<f64>,
    /// Present value of each projected year.
    pub discounted_fcf: Vec<f64>,
    /// Gordon-growth terminal value at the horizon.
    pub terminal_value: f64,
    /// Present value of the terminal value.
    pub terminal_value_pv: f64,
    /// Sum of all present values (enterprise value).
    pub enterprise_value: f64,
    /// Net debt subtracted to reach equity value.
    pub net_debt: f64,
    /// Enterprise value less net debt.
    pub equity_value: f64,
    /// Equity value per share, when shares outstanding is known.
    pub intrinsic_value_per_share: Option<f64>,
}

/// Combined valuation output for one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// The valued entity.
    pub entity: EntityId,
    /// Report date of the most recent reconstructed quarter.
    pub as_of: Option<NaiveDate>,
    /// PE band output, or why it is unavailable.
    pub pe_band: Computed<PeBandReport>,
    /// WACC breakdown, or why it is unavailable.
    pub wacc: Computed<WaccBreakdown>,
    /// DCF output, or why it is unavailable.
    pub dcf: Computed<DcfReport>,
    /// Every data-quality warning collected along the pipeline.
    pub warnings: Vec<DataQualityWarning>,
}
