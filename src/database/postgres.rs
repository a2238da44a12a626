use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::MonthlyRateStore;
use crate::error::FxError;
use crate::models::{DatabaseSettings, MonthlyRateRow};

/// Postgres warehouse store. Holds a single connection for the whole run.
pub struct PgRateStore {
    pool: PgPool,
    table: String,
}

impl PgRateStore {
    pub async fn connect(settings: &DatabaseSettings, table: &str) -> Result<Self, FxError> {
        let options = connect_options(settings)?;

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        info!("Connected to Postgres, writing to {}", table);
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Create the target schema and table if they do not exist yet.
    pub async fn ensure_table(&self) -> Result<(), FxError> {
        if let Some((schema, _)) = self.table.split_once('.') {
            sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
                .execute(&self.pool)
                .await?;
        }

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                month_sk DATE NOT NULL,
                currency_code TEXT NOT NULL,
                avg_rate_to_eur DOUBLE PRECISION NOT NULL CHECK (avg_rate_to_eur > 0),
                obs_count INTEGER NOT NULL,
                source TEXT NOT NULL,
                UNIQUE (month_sk, currency_code)
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await?;

        info!("Ensured table {} exists", self.table);
        Ok(())
    }
}

#[async_trait]
impl MonthlyRateStore for PgRateStore {
    async fn upsert_monthly(&self, rows: &[MonthlyRateRow]) -> Result<u64, FxError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"
            INSERT INTO {} (month_sk, currency_code, avg_rate_to_eur, obs_count, source)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (month_sk, currency_code) DO UPDATE SET
                avg_rate_to_eur = EXCLUDED.avg_rate_to_eur,
                obs_count = EXCLUDED.obs_count,
                source = EXCLUDED.source
            "#,
            self.table
        );

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for row in rows {
            let result = sqlx::query(&sql)
                .bind(row.month_sk)
                .bind(row.currency_code.as_str())
                .bind(row.avg_rate_to_base)
                .bind(obs_count_param(row.obs_count)?)
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
        info!("Postgres connection closed");
    }
}

/// `obs_count` is an INTEGER column; counts beyond `i32::MAX` are rejected rather than clamped.
fn obs_count_param(obs_count: u32) -> Result<i32, FxError> {
    i32::try_from(obs_count).map_err(|e| FxError::Database(sqlx::Error::Encode(Box::new(e))))
}

/// `DATABASE_URL` when set, otherwise the individual `PG*` parameters.
pub fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions, FxError> {
    if let Some(url) = &settings.url {
        return PgConnectOptions::from_str(url)
            .map_err(|e| FxError::Config(format!("invalid DATABASE_URL: {}", e)));
    }

    let database = settings
        .database
        .as_deref()
        .ok_or_else(|| FxError::Config("PGDATABASE is required when DATABASE_URL is not set".to_string()))?;

    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .database(database);
    if let Some(user) = &settings.user {
        options = options.username(user);
    }
    if let Some(password) = &settings.password {
        options = options.password(password);
    }
    Ok(options)
}
