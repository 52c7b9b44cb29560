#![forbid(unsafe_code)]

//! Core types and collaborator traits for the equity valuation engine.
//!
//! This crate provides the foundational abstractions shared by the
//! valuation pipeline:
//!
//! - [`PeriodFact`](types::PeriodFact) - One reported statement row
//! - [`QuarterSeries`](series::QuarterSeries) - Reconstructed single-quarter series
//! - [`ValuationAssumptions`](assumptions::ValuationAssumptions) - Per-run configuration
//! - [`ValuationResult`](report::ValuationResult) - Combined exported output
//! - [`PeriodStore`](store::PeriodStore) - Persisted per-period facts
//! - [`MarketData`](market::MarketData) - Lazily backfilled price observations

/// Per-run valuation assumptions.
pub mod assumptions;
/// Error types for valuation operations.
pub mod error;
/// Fiscal period definitions.
pub mod fiscal;
/// Market data trait.
pub mod market;
/// Typed computation outcomes and data-quality warnings.
pub mod outcome;
/// Valuation output types.
pub mod report;
/// Reconstructed single-quarter series.
pub mod series;
/// Period store trait.
pub mod store;
/// Core data types (entity, metrics, facts, observations).
pub mod types;

// Re-export commonly used items at crate root
pub use assumptions::{CapitalWeights, GrowthAssumption, ValuationAssumptions};
pub use error::{Result, ValuationError};
pub use fiscal::{FiscalQuarter, ReportingBasis};
pub use market::MarketData;
pub use outcome::{Computed, DataQualityWarning, UnavailableReason};
pub use report::{
    DcfReport, PeBandReport, PeBandVerdict, PercentileGrid, ValuationResult, WaccBreakdown,
};
pub use series::{AnnualFact, QuarterSeries, SqFact};
pub use store::PeriodStore;
pub use types::{EntityId, MarketObservation, Metric, MetricSet, PeriodFact};
