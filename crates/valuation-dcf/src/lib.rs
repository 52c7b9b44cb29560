#![forbid(unsafe_code)]

//! WACC calculator and discounted-cash-flow valuation engine.
//!
//! - [`compute_wacc`] blends CAPM cost of equity with after-tax cost of
//!   debt under the observed or target capital structure.
//! - [`compute_dcf`] projects trailing free cash flow over an explicit
//!   horizon, discounts it at the WACC, and adds a Gordon-growth terminal
//!   value, bridging to per-share equity value.
//! - [`suggest_growth_rate`] derives a growth hint from historical annual
//!   free cash flow.

/// Discounted-cash-flow intrinsic valuation.
pub mod dcf;
/// Weighted-average cost of capital.
pub mod wacc;

pub use dcf::{compute_dcf, suggest_growth_rate};
pub use wacc::{CapitalStructure, compute_wacc};
