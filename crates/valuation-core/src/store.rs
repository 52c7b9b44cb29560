//! Period store trait for persisted per-period financial facts.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EntityId, PeriodFact};

/// Typed accessor over externally persisted per-period financial facts.
///
/// Implementations must uphold the uniqueness invariant: at most one fact
/// per `(entity, fiscal_year, fiscal_quarter, basis)`, with
/// [`put_period`](Self::put_period) acting as an idempotent upsert so a
/// restated figure overwrites the prior one.
#[async_trait]
pub trait PeriodStore: Send + Sync {
    /// Returns all facts for an entity in chronological report order.
    async fn get_periods(&self, entity: &EntityId) -> Result<Vec<PeriodFact>>;

    /// Inserts or overwrites the fact keyed by
    /// `(entity, fiscal_year, fiscal_quarter, basis)`.
    async fn put_period(&self, entity: &EntityId, fact: PeriodFact) -> Result<()>;
}
