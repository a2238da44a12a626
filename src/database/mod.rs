use async_trait::async_trait;
use tracing::info;

use crate::error::FxError;
use crate::models::MonthlyRateRow;

pub mod postgres;
pub mod sqlite;

pub use postgres::PgRateStore;
pub use sqlite::SqliteRateStore;

/// Warehouse table of monthly averages, unique on (month_sk, currency_code).
#[async_trait]
pub trait MonthlyRateStore: Send + Sync {
    /// Insert-or-update every row in a single transaction. Returns the number of rows written.
    async fn upsert_monthly(&self, rows: &[MonthlyRateRow]) -> Result<u64, FxError>;

    /// Release the underlying connection.
    async fn close(&self);
}

/// Store that only logs what would have been written.
#[derive(Debug, Default)]
pub struct DryRunStore;

#[async_trait]
impl MonthlyRateStore for DryRunStore {
    async fn upsert_monthly(&self, rows: &[MonthlyRateRow]) -> Result<u64, FxError> {
        for row in rows {
            info!(
                "[dry-run] {} {} avg_rate_to_eur={:.8} obs_count={} source={}",
                row.month_sk, row.currency_code, row.avg_rate_to_base, row.obs_count, row.source
            );
        }
        Ok(rows.len() as u64)
    }

    async fn close(&self) {}
}
