use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::debug;

use crate::error::SourceError;
use crate::models::{CurrencyCode, DailyRateTable, MonthKey};

pub mod exchangerate_host_client;
pub mod frankfurter_client;

pub use exchangerate_host_client::ExchangeRateHostClient;
pub use frankfurter_client::FrankfurterClient;

/// Currencies the primary provider claims to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupportedCurrencies {
    Known(BTreeSet<CurrencyCode>),
    /// The capability query failed; callers assume every currency is supported.
    Unknown,
}

/// Provider that serves its full day-by-day rate table for a month.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrimaryRateSource: Send + Sync {
    /// Provenance label written with every row this source contributes.
    fn label(&self) -> String;

    /// Never fails: provider errors degrade to `SupportedCurrencies::Unknown`.
    async fn supported_currencies(&self) -> SupportedCurrencies;

    /// Never fails: provider errors degrade to an empty table.
    async fn fetch_month(&self, month: MonthKey) -> DailyRateTable;
}

/// Best-effort fallback provider queried for an explicit list of currencies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecondaryRateSource: Send + Sync {
    fn label(&self) -> String;

    /// Never fails: provider errors degrade to an empty table.
    async fn fetch_month(&self, month: MonthKey, symbols: &[CurrencyCode]) -> DailyRateTable;
}

/// `{"rates": {"2024-01-02": {"DKK": 7.45, ...}, ...}}` as returned by both providers.
#[derive(Debug, Deserialize)]
pub(crate) struct RatesEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    rates: BTreeMap<String, BTreeMap<String, Value>>,
}

impl RatesEnvelope {
    /// Convert to a rate table, rejecting provider-reported errors and
    /// dropping keys or values that cannot take part in an average.
    pub(crate) fn into_table(self) -> Result<DailyRateTable, SourceError> {
        if self.success == Some(false) {
            let message = self
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "success=false".to_string());
            return Err(SourceError::Provider(message));
        }

        let mut table = DailyRateTable::new();
        for (date, day_rates) in self.rates {
            let mut day = BTreeMap::new();
            for (code, value) in day_rates {
                let rate = value.as_f64().filter(|v| v.is_finite() && *v > 0.0);
                match (CurrencyCode::new(&code), rate) {
                    (Ok(currency), Some(rate)) => {
                        day.insert(currency, rate);
                    }
                    _ => debug!("Dropping unusable rate {}={} on {}", code, value, date),
                }
            }
            table.insert(date, day);
        }
        Ok(table)
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, SourceError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent("fx-monthly/1.0")
        .build()?;
    Ok(client)
}

/// Turn a non-2xx response into `SourceError::Status`.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, SourceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Status { status, body })
}
