//! The valuation orchestrator.
//!
//! [`Valuator`] sequences one entity's pipeline: fetch period facts,
//! reconstruct single quarters, then run the PE band, WACC, and DCF
//! engines, merging every data-quality warning into the final
//! [`ValuationResult`]. Entities are independent: valuations for
//! different entities run in parallel on their own snapshots, and a
//! collaborator timeout fails only the affected entity.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};
use valuation_core::{
    Computed, EntityId, MarketData, MarketObservation, Metric, PeriodStore, Result,
    ValuationAssumptions, ValuationError, ValuationResult,
};
use valuation_dcf::{CapitalStructure, compute_dcf, compute_wacc};
use valuation_pe::compute_pe_band;
use valuation_transform::reconstruct;

/// Default deadline for a single collaborator call.
const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrates the valuation pipeline over the two collaborators.
#[derive(Clone)]
pub struct Valuator {
    store: Arc<dyn PeriodStore>,
    market: Arc<dyn MarketData>,
    timeout: Duration,
}

impl std::fmt::Debug for Valuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Valuator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Valuator {
    /// Creates a valuator over a period store and a market data source.
    #[must_use]
    pub fn new(store: Arc<dyn PeriodStore>, market: Arc<dyn MarketData>) -> Self {
        Self {
            store,
            market,
            timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    /// Sets the deadline applied to each collaborator call.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Values a single entity.
    ///
    /// Recoverable engine failures (insufficient history, undefined PE,
    /// WACC not above terminal growth, missing inputs) degrade the
    /// affected sub-computation to `Unavailable` while the others still
    /// run; every warning collected along the way is propagated.
    ///
    /// # Errors
    ///
    /// Returns [`ValuationError::DataUnavailable`] when a collaborator
    /// times out or fails. The error is scoped to this entity.
    #[instrument(skip(self, assumptions), fields(entity = %entity))]
    pub async fn value(
        &self,
        entity: &EntityId,
        assumptions: &ValuationAssumptions,
    ) -> Result<ValuationResult> {
        let facts = self
            .collaborate(entity, "period store", self.store.get_periods(entity))
            .await?;
        let transformed = reconstruct(entity, &facts);
        let (series, mut warnings) = (transformed.series, transformed.warnings);

        let history = self
            .collaborate(entity, "market data", self.market.history(entity))
            .await?;

        let pe_band = fold(compute_pe_band(
            &series,
            &history,
            assumptions,
            &mut warnings,
        ))?;

        let latest_observation = history.last();
        let capital = CapitalStructure {
            market_cap: market_cap_of(latest_observation),
            total_debt: series.latest_point_in_time(Metric::TotalDebt),
            ttm_interest_expense: series.ttm(Metric::InterestExpense),
        };
        let wacc = fold(compute_wacc(&capital, assumptions, &mut warnings))?;

        // The DCF needs a discount rate; without a WACC it inherits the
        // same unavailability instead of inventing one.
        let dcf = match &wacc {
            Computed::Available(breakdown) => fold(compute_dcf(
                &series,
                breakdown.wacc,
                assumptions,
                latest_observation.and_then(|obs| obs.shares_outstanding),
            ))?,
            Computed::Unavailable(reason) => Computed::Unavailable(reason.clone()),
        };

        debug!(
            pe_available = pe_band.is_available(),
            dcf_available = dcf.is_available(),
            warnings = warnings.len(),
            "valuation assembled"
        );
        Ok(ValuationResult {
            entity: entity.clone(),
            as_of: series.last().map(|quarter| quarter.report_date),
            pe_band,
            wacc,
            dcf,
            warnings,
        })
    }

    /// Values many entities in parallel, one task per entity.
    ///
    /// Results come back in input order. A failure (including
    /// [`ValuationError::DataUnavailable`]) affects only its own entity
    /// and never aborts sibling valuations.
    pub async fn value_many(
        &self,
        entities: &[EntityId],
        assumptions: &ValuationAssumptions,
    ) -> Vec<(EntityId, Result<ValuationResult>)> {
        let mut tasks = JoinSet::new();
        for (index, entity) in entities.iter().cloned().enumerate() {
            let valuator = self.clone();
            let assumptions = assumptions.clone();
            tasks.spawn(async move {
                let result = valuator.value(&entity, &assumptions).await;
                (index, entity, result)
            });
        }

        let mut slots: Vec<Option<(EntityId, Result<ValuationResult>)>> =
            (0..entities.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entity, result)) => slots[index] = Some((entity, result)),
                Err(err) => warn!(error = %err, "valuation task panicked"),
            }
        }
        slots.into_iter().flatten().collect()
    }

    /// Awaits a collaborator call under the configured deadline, scoping
    /// any failure to the entity being valued.
    async fn collaborate<T>(
        &self,
        entity: &EntityId,
        what: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ValuationError::DataUnavailable {
                entity: entity.to_string(),
                reason: format!("{what}: {err}"),
            }),
            Err(_) => Err(ValuationError::DataUnavailable {
                entity: entity.to_string(),
                reason: format!("{what} timed out after {:?}", self.timeout),
            }),
        }
    }
}

/// Folds recoverable engine errors into an `Unavailable` outcome; anything
/// else propagates and aborts this entity's run.
fn fold<T>(result: Result<T>) -> Result<Computed<T>> {
    match result {
        Ok(value) => Ok(Computed::Available(value)),
        Err(err) => match err.as_unavailable() {
            Some(reason) => Ok(Computed::Unavailable(reason)),
            None => Err(err),
        },
    }
}

/// Market capitalization from an observation, falling back to price times
/// shares when only those are known.
fn market_cap_of(observation: Option<&MarketObservation>) -> Option<f64> {
    let observation = observation?;
    observation
        .market_cap
        .or_else(|| observation.shares_outstanding.map(|s| s * observation.close))
}
