//! Test store helpers

use async_trait::async_trait;
use fx_monthly::database::{MonthlyRateStore, SqliteRateStore};
use fx_monthly::error::FxError;
use fx_monthly::models::{MonthKey, MonthlyRateRow};
use std::sync::{Arc, Mutex};

/// Fresh in-memory SQLite warehouse.
pub async fn init_memory_store() -> SqliteRateStore {
    SqliteRateStore::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory store")
}

/// Store whose upserts fail for selected months and succeed (recording rows) otherwise.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub failing: Vec<MonthKey>,
    pub written: Arc<Mutex<Vec<MonthlyRateRow>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl FlakyStore {
    pub fn failing_on(months: Vec<MonthKey>) -> Self {
        Self {
            failing: months,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MonthlyRateStore for FlakyStore {
    async fn upsert_monthly(&self, rows: &[MonthlyRateRow]) -> Result<u64, FxError> {
        if rows.iter().any(|r| self.failing.iter().any(|m| m.month_sk() == r.month_sk)) {
            return Err(FxError::Database(sqlx::Error::PoolClosed));
        }
        self.written.lock().unwrap().extend_from_slice(rows);
        Ok(rows.len() as u64)
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}
