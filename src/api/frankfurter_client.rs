use async_trait::async_trait;
use reqwest::Client;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use super::{build_http_client, ensure_success, PrimaryRateSource, RatesEnvelope, SupportedCurrencies};
use crate::error::SourceError;
use crate::models::{CurrencyCode, DailyRateTable, MonthKey, SourceConfig};

pub const FRANKFURTER_LABEL: &str = "frankfurter";

/// Client for the Frankfurter API (ECB reference rates, EUR based).
pub struct FrankfurterClient {
    client: Client,
    base_url: String,
}

impl FrankfurterClient {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_http_client(config.timeout)?,
            base_url: config.base_url.clone(),
        })
    }

    /// `GET /currencies`, returning the raw error on failure.
    pub async fn try_supported_currencies(&self) -> Result<BTreeSet<CurrencyCode>, SourceError> {
        let url = format!("{}/currencies", self.base_url);
        debug!("Making request to: {}", url);

        let response = ensure_success(self.client.get(&url).send().await?).await?;
        let names: BTreeMap<String, String> = response.json().await?;

        Ok(names.keys().filter_map(|code| CurrencyCode::new(code).ok()).collect())
    }

    /// `GET /{start}..{end}`, returning the raw error on failure.
    pub async fn try_fetch_month(&self, month: MonthKey) -> Result<DailyRateTable, SourceError> {
        let (start, end) = month.window();
        let url = format!("{}/{}..{}", self.base_url, start.format("%Y-%m-%d"), end.format("%Y-%m-%d"));
        debug!("Making request to: {}", url);

        let response = ensure_success(self.client.get(&url).send().await?).await?;
        let envelope: RatesEnvelope = response.json().await?;
        envelope.into_table()
    }
}

#[async_trait]
impl PrimaryRateSource for FrankfurterClient {
    fn label(&self) -> String {
        FRANKFURTER_LABEL.to_string()
    }

    async fn supported_currencies(&self) -> SupportedCurrencies {
        match self.try_supported_currencies().await {
            Ok(codes) => {
                debug!("Frankfurter supports {} currencies", codes.len());
                SupportedCurrencies::Known(codes)
            }
            Err(e) => {
                warn!("Could not fetch Frankfurter supported currencies: {}", e);
                SupportedCurrencies::Unknown
            }
        }
    }

    async fn fetch_month(&self, month: MonthKey) -> DailyRateTable {
        match self.try_fetch_month(month).await {
            Ok(table) => {
                if table.is_empty() {
                    warn!("Frankfurter returned no rates for {}", month);
                }
                table
            }
            Err(e) => {
                warn!("Frankfurter request failed for {}: {}", month, e);
                DailyRateTable::new()
            }
        }
    }
}
