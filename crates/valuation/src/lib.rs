#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Multi-signal equity valuation pipeline.
//!
//! This crate ties the engines together behind a single [`Valuator`]: it
//! loads reported period facts from a [`PeriodStore`], reconstructs true
//! single-quarter figures, and runs the PE-band, WACC, and DCF engines,
//! returning one [`ValuationResult`] per entity. Sub-computations that
//! cannot be produced for a recoverable reason come back as
//! [`Computed::Unavailable`] instead of failing the run.
//!
//! # Features
//!
//! - `store-sqlite` - SQLite-backed period store
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use valuation::{
//!     EntityId, MemoryMarketData, MemoryPeriodStore, ValuationAssumptions, Valuator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> valuation::Result<()> {
//!     let store = Arc::new(MemoryPeriodStore::new());
//!     let market = Arc::new(MemoryMarketData::new());
//!     let valuator = Valuator::new(store, market);
//!
//!     let entity = EntityId::new("ACME");
//!     let result = valuator.value(&entity, &ValuationAssumptions::default()).await?;
//!     println!("{result:?}");
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use valuation_core::*;

// Engines
pub use valuation_dcf::{CapitalStructure, compute_dcf, compute_wacc, suggest_growth_rate};
pub use valuation_pe::compute_pe_band;
pub use valuation_transform::{Transformed, reconstruct};

// Store implementations
#[cfg(feature = "store-sqlite")]
pub use valuation_store::SqlitePeriodStore;
pub use valuation_store::{MemoryMarketData, MemoryPeriodStore};

mod pipeline;
pub use pipeline::Valuator;
