//! Market data trait for lazily backfilled price observations.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{EntityId, MarketObservation};

/// Provider of closing prices and market capitalization.
///
/// Backfill, retry, and rate-limit policy live behind this trait; the
/// valuation core only reads. `Ok(None)` models not-found and must be
/// tolerated by callers by excluding that date, never by failing the run.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Returns the observation recorded for an entity on a date, if any.
    async fn observation(
        &self,
        entity: &EntityId,
        date: NaiveDate,
    ) -> Result<Option<MarketObservation>>;

    /// Returns all recorded observations for an entity, ascending by date.
    async fn history(&self, entity: &EntityId) -> Result<Vec<MarketObservation>>;
}
