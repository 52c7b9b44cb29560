#![forbid(unsafe_code)]

//! Period store and market data implementations.
//!
//! - [`MemoryPeriodStore`](memory::MemoryPeriodStore) - In-memory store for testing and development
//! - [`SqlitePeriodStore`](sqlite::SqlitePeriodStore) - Persistent SQLite-backed store
//! - [`MemoryMarketData`](memory::MemoryMarketData) - Pre-recorded market observations

/// In-memory store implementations.
pub mod memory;

/// SQLite-based period store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::{MemoryMarketData, MemoryPeriodStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqlitePeriodStore;
