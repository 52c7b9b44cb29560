//! In-memory store implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use valuation_core::{
    EntityId, FiscalQuarter, MarketData, MarketObservation, PeriodFact, PeriodStore,
    ReportingBasis, Result,
};

/// Uniqueness key for one reported fact.
type FactKey = (i32, Option<FiscalQuarter>, ReportingBasis);

/// Simple in-memory period store for testing and development.
///
/// Facts live in a `RwLock`-protected map keyed by
/// `(fiscal_year, fiscal_quarter, basis)` per entity, so a restated fact
/// overwrites the prior one for the same key. Data is lost when the store
/// is dropped.
#[derive(Debug, Default)]
pub struct MemoryPeriodStore {
    facts: RwLock<HashMap<EntityId, BTreeMap<FactKey, PeriodFact>>>,
}

impl MemoryPeriodStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PeriodStore for MemoryPeriodStore {
    #[instrument(skip(self), fields(entity = %entity))]
    async fn get_periods(&self, entity: &EntityId) -> Result<Vec<PeriodFact>> {
        let facts = self.facts.read().await;
        let periods: Vec<PeriodFact> = facts
            .get(entity)
            .map(|by_key| by_key.values().cloned().collect())
            .unwrap_or_default();
        debug!("loaded {} period facts", periods.len());
        Ok(periods)
    }

    #[instrument(skip(self, fact), fields(entity = %entity, fiscal_year = fact.fiscal_year))]
    async fn put_period(&self, entity: &EntityId, fact: PeriodFact) -> Result<()> {
        let key = (fact.fiscal_year, fact.fiscal_quarter, fact.basis);
        let mut facts = self.facts.write().await;
        let replaced = facts
            .entry(entity.clone())
            .or_default()
            .insert(key, fact)
            .is_some();
        debug!(replaced, "stored period fact");
        Ok(())
    }
}

/// In-memory market data backed by pre-recorded observations.
///
/// Observations are immutable once recorded for a date: a second record
/// for the same `(entity, date)` is ignored.
#[derive(Debug, Default)]
pub struct MemoryMarketData {
    observations: RwLock<HashMap<EntityId, BTreeMap<NaiveDate, MarketObservation>>>,
}

impl MemoryMarketData {
    /// Create a new empty market data store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an observation unless one already exists for its date.
    pub async fn record(&self, observation: MarketObservation) {
        let mut observations = self.observations.write().await;
        observations
            .entry(observation.entity.clone())
            .or_default()
            .entry(observation.date)
            .or_insert(observation);
    }
}

#[async_trait]
impl MarketData for MemoryMarketData {
    #[instrument(skip(self), fields(entity = %entity))]
    async fn observation(
        &self,
        entity: &EntityId,
        date: NaiveDate,
    ) -> Result<Option<MarketObservation>> {
        let observations = self.observations.read().await;
        Ok(observations
            .get(entity)
            .and_then(|by_date| by_date.get(&date))
            .cloned())
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn history(&self, entity: &EntityId) -> Result<Vec<MarketObservation>> {
        let observations = self.observations.read().await;
        Ok(observations
            .get(entity)
            .map(|by_date| by_date.values().cloned().collect())
            .unwrap_or_default())
    }
}
