use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

use super::MonthlyRateStore;
use crate::error::FxError;
use crate::models::{CurrencyCode, MonthlyRateRow};

pub const SQLITE_TABLE: &str = "fx_rates_monthly";

/// Local SQLite copy of the warehouse table, used for development runs and tests.
#[derive(Clone)]
pub struct SqliteRateStore {
    pool: SqlitePool,
}

impl SqliteRateStore {
    /// Open (or create) the database at `url`, e.g. `sqlite:fx.db` or `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self, FxError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // One connection that never expires, so `sqlite::memory:` keeps its contents.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                month_sk DATE NOT NULL,
                currency_code TEXT NOT NULL,
                avg_rate_to_eur REAL NOT NULL CHECK (avg_rate_to_eur > 0),
                obs_count INTEGER NOT NULL,
                source TEXT NOT NULL,
                UNIQUE (month_sk, currency_code)
            )
            "#,
            SQLITE_TABLE
        ))
        .execute(&pool)
        .await?;

        info!("SQLite store ready at {}", url);
        Ok(Self { pool })
    }

    /// Rows stored for one month, ordered by currency code.
    pub async fn monthly_rows(&self, month_sk: NaiveDate) -> Result<Vec<MonthlyRateRow>, FxError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT month_sk, currency_code, avg_rate_to_eur, obs_count, source
            FROM {}
            WHERE month_sk = ?
            ORDER BY currency_code
            "#,
            SQLITE_TABLE
        ))
        .bind(month_sk)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| -> Result<MonthlyRateRow, FxError> {
                let obs_count = u32::try_from(r.try_get::<i64, _>("obs_count")?)
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(MonthlyRateRow {
                    month_sk: r.try_get::<NaiveDate, _>("month_sk")?,
                    currency_code: CurrencyCode::new(&r.try_get::<String, _>("currency_code")?)?,
                    avg_rate_to_base: r.try_get::<f64, _>("avg_rate_to_eur")?,
                    obs_count,
                    source: r.try_get::<String, _>("source")?,
                })
            })
            .collect()
    }

    pub async fn row_count(&self) -> Result<i64, FxError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", SQLITE_TABLE))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}

#[async_trait]
impl MonthlyRateStore for SqliteRateStore {
    async fn upsert_monthly(&self, rows: &[MonthlyRateRow]) -> Result<u64, FxError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"
            INSERT INTO {} (month_sk, currency_code, avg_rate_to_eur, obs_count, source)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(month_sk, currency_code) DO UPDATE SET
                avg_rate_to_eur = excluded.avg_rate_to_eur,
                obs_count = excluded.obs_count,
                source = excluded.source
            "#,
            SQLITE_TABLE
        );

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for row in rows {
            let result = sqlx::query(&sql)
                .bind(row.month_sk)
                .bind(row.currency_code.as_str())
                .bind(row.avg_rate_to_base)
                .bind(i64::from(row.obs_count))
                .bind(&row.source)
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
