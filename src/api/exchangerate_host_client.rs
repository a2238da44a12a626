use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{build_http_client, ensure_success, RatesEnvelope, SecondaryRateSource};
use crate::error::SourceError;
use crate::models::{CurrencyCode, DailyRateTable, MonthKey, SourceConfig};

pub const EXCHANGERATE_HOST_LABEL: &str = "exchangerate.host";

/// Client for the exchangerate.host `timeseries` endpoint.
pub struct ExchangeRateHostClient {
    client: Client,
    base_url: String,
    access_key: Option<String>,
    base_currency: CurrencyCode,
}

impl ExchangeRateHostClient {
    pub fn new(config: &SourceConfig, base_currency: CurrencyCode) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_http_client(config.timeout)?,
            base_url: config.base_url.clone(),
            access_key: config.access_key.clone(),
            base_currency,
        })
    }

    /// `GET /timeseries?start_date=..&end_date=..&base=..&symbols=..`, returning the raw error on failure.
    pub async fn try_fetch_month(
        &self,
        month: MonthKey,
        symbols: &[CurrencyCode],
    ) -> Result<DailyRateTable, SourceError> {
        let (start, end) = month.window();
        let symbols = symbols.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",");

        let mut query = vec![
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
            ("base", self.base_currency.to_string()),
            ("symbols", symbols),
        ];
        if let Some(key) = &self.access_key {
            query.push(("access_key", key.clone()));
        }

        let url = format!("{}/timeseries", self.base_url);
        debug!("Making request to: {} for {}", url, month);

        let response = ensure_success(self.client.get(&url).query(&query).send().await?).await?;
        let envelope: RatesEnvelope = response.json().await?;
        envelope.into_table()
    }
}

#[async_trait]
impl SecondaryRateSource for ExchangeRateHostClient {
    fn label(&self) -> String {
        EXCHANGERATE_HOST_LABEL.to_string()
    }

    async fn fetch_month(&self, month: MonthKey, symbols: &[CurrencyCode]) -> DailyRateTable {
        if symbols.is_empty() {
            return DailyRateTable::new();
        }

        match self.try_fetch_month(month, symbols).await {
            Ok(table) if table.is_empty() => {
                warn!("exchangerate.host returned no rates for {}", month);
                table
            }
            Ok(table) => table,
            Err(e) => {
                warn!("exchangerate.host request failed for {}: {}", month, e);
                DailyRateTable::new()
            }
        }
    }
}
