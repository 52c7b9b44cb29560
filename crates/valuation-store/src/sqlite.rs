//! SQLite-based period store implementation.

use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};
use valuation_core::{
    EntityId, PeriodFact, PeriodStore, ReportingBasis, Result, ValuationError,
};

/// SQLite-backed period store.
///
/// Facts persist across restarts in a single table whose composite primary
/// key enforces the uniqueness invariant: at most one fact per
/// `(entity, fiscal_year, fiscal_quarter, basis)`. Writes are upserts, so
/// a restated figure overwrites the previously stored row.
#[derive(Debug)]
pub struct SqlitePeriodStore {
    conn: Mutex<Connection>,
}

impl SqlitePeriodStore {
    /// Create a new store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema
    /// creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| ValuationError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| ValuationError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    ///
    /// Annual facts store quarter 0 so the NOT NULL primary-key column can
    /// participate in the uniqueness constraint.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ValuationError::Store(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS period_facts (
                entity TEXT NOT NULL,
                fiscal_year INTEGER NOT NULL,
                fiscal_quarter INTEGER NOT NULL,
                basis TEXT NOT NULL,
                report_date TEXT NOT NULL,
                fact_json TEXT NOT NULL,
                PRIMARY KEY (entity, fiscal_year, fiscal_quarter, basis)
            )",
            [],
        )
        .map_err(|e| ValuationError::Store(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_period_facts_entity
             ON period_facts(entity, fiscal_year, fiscal_quarter)",
            [],
        )
        .map_err(|e| ValuationError::Store(e.to_string()))?;

        Ok(())
    }
}

/// Stable text tag for the basis column.
const fn basis_tag(basis: ReportingBasis) -> &'static str {
    match basis {
        ReportingBasis::Cumulative => "cumulative",
        ReportingBasis::SingleQuarter => "single_quarter",
        ReportingBasis::Annual => "annual",
    }
}

#[async_trait]
impl PeriodStore for SqlitePeriodStore {
    #[instrument(skip(self), fields(entity = %entity))]
    async fn get_periods(&self, entity: &EntityId) -> Result<Vec<PeriodFact>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ValuationError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT fact_json FROM period_facts
                 WHERE entity = ?1
                 ORDER BY fiscal_year, fiscal_quarter, basis",
            )
            .map_err(|e| ValuationError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params![entity.as_str()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| ValuationError::Store(e.to_string()))?;

        let mut periods = Vec::new();
        for row in rows {
            let json = row.map_err(|e| ValuationError::Store(e.to_string()))?;
            let fact: PeriodFact =
                serde_json::from_str(&json).map_err(|e| ValuationError::Store(e.to_string()))?;
            periods.push(fact);
        }
        debug!("loaded {} period facts", periods.len());
        Ok(periods)
    }

    #[instrument(skip(self, fact), fields(entity = %entity, fiscal_year = fact.fiscal_year))]
    async fn put_period(&self, entity: &EntityId, fact: PeriodFact) -> Result<()> {
        let json =
            serde_json::to_string(&fact).map_err(|e| ValuationError::Store(e.to_string()))?;
        let quarter = fact.fiscal_quarter.map_or(0, |q| i64::from(q.number()));

        let conn = self
            .conn
            .lock()
            .map_err(|e| ValuationError::Store(e.to_string()))?;
        conn.execute(
            "INSERT INTO period_facts
                (entity, fiscal_year, fiscal_quarter, basis, report_date, fact_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(entity, fiscal_year, fiscal_quarter, basis)
             DO UPDATE SET report_date = excluded.report_date,
                           fact_json = excluded.fact_json",
            params![
                entity.as_str(),
                i64::from(fact.fiscal_year),
                quarter,
                basis_tag(fact.basis),
                fact.report_date.to_string(),
                json,
            ],
        )
        .map_err(|e| ValuationError::Store(e.to_string()))?;
        debug!("stored period fact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use valuation_core::FiscalQuarter;

    fn fact(year: i32, quarter: Option<u8>, basis: ReportingBasis, revenue: f64) -> PeriodFact {
        let mut fact = PeriodFact::new(
            EntityId::new("TEST"),
            year,
            quarter.map(|q| FiscalQuarter::try_from(q).unwrap()),
            basis,
            NaiveDate::from_ymd_opt(year, 6, 28).unwrap(),
            "USD",
        );
        fact.metrics.revenue = Some(revenue);
        fact
    }

    #[tokio::test]
    async fn test_sqlite_store_roundtrips_field_for_field() {
        let store = SqlitePeriodStore::in_memory().unwrap();
        let entity = EntityId::new("TEST");
        let original = fact(2024, Some(2), ReportingBasis::Cumulative, 220.0);

        store.put_period(&entity, original.clone()).await.unwrap();
        let periods = store.get_periods(&entity).await.unwrap();
        assert_eq!(periods, vec![original]);
    }

    #[tokio::test]
    async fn test_sqlite_store_upserts_on_four_part_key() {
        let store = SqlitePeriodStore::in_memory().unwrap();
        let entity = EntityId::new("TEST");

        store
            .put_period(&entity, fact(2024, Some(2), ReportingBasis::Cumulative, 220.0))
            .await
            .unwrap();
        // Same key: overwrites.
        store
            .put_period(&entity, fact(2024, Some(2), ReportingBasis::Cumulative, 230.0))
            .await
            .unwrap();
        // Different basis: coexists.
        store
            .put_period(&entity, fact(2024, Some(2), ReportingBasis::SingleQuarter, 120.0))
            .await
            .unwrap();

        let periods = store.get_periods(&entity).await.unwrap();
        assert_eq!(periods.len(), 2);
        let cumulative = periods
            .iter()
            .find(|p| p.basis == ReportingBasis::Cumulative)
            .unwrap();
        assert_eq!(cumulative.metrics.revenue, Some(230.0));
    }

    #[tokio::test]
    async fn test_sqlite_store_keeps_annual_and_quarterly_apart() {
        let store = SqlitePeriodStore::in_memory().unwrap();
        let entity = EntityId::new("TEST");

        store
            .put_period(&entity, fact(2024, None, ReportingBasis::Annual, 480.0))
            .await
            .unwrap();
        store
            .put_period(&entity, fact(2024, Some(1), ReportingBasis::Cumulative, 100.0))
            .await
            .unwrap();

        let periods = store.get_periods(&entity).await.unwrap();
        assert_eq!(periods.len(), 2);
        // Annual rows sort first (quarter 0).
        assert_eq!(periods[0].basis, ReportingBasis::Annual);
    }
}
