//! Batch orchestration: walks a range of months, loading each one
//! independently so a single bad month never aborts the run.

use tracing::{error, info, warn};

use crate::aggregator::aggregate_month;
use crate::api::{PrimaryRateSource, SecondaryRateSource, SupportedCurrencies};
use crate::database::MonthlyRateStore;
use crate::error::FxError;
use crate::merger::gather_month;
use crate::models::{BatchResult, CurrencyCode, MonthKey};

/// Loads monthly average FX rates from two sources into a store.
pub struct MonthlyFxLoader {
    primary: Box<dyn PrimaryRateSource>,
    secondary: Box<dyn SecondaryRateSource>,
    store: Box<dyn MonthlyRateStore>,
    base_currency: CurrencyCode,
    requested: Vec<CurrencyCode>,
}

impl MonthlyFxLoader {
    /// `requested` is the list of non-base currencies to load for every month.
    pub fn new(
        primary: Box<dyn PrimaryRateSource>,
        secondary: Box<dyn SecondaryRateSource>,
        store: Box<dyn MonthlyRateStore>,
        base_currency: CurrencyCode,
        requested: Vec<CurrencyCode>,
    ) -> Self {
        let requested = requested.into_iter().filter(|c| c != &base_currency).collect();
        Self {
            primary,
            secondary,
            store,
            base_currency,
            requested,
        }
    }

    pub fn requested_currencies(&self) -> &[CurrencyCode] {
        &self.requested
    }

    /// Load every month of `start_year..=end_year`.
    pub async fn run(&self, start_year: i32, end_year: i32) -> BatchResult {
        info!("📈 Loading monthly FX averages for {}..={}", start_year, end_year);
        self.run_months(MonthKey::year_range(start_year, end_year)).await
    }

    /// Load the given months in order, recording failures without stopping.
    pub async fn run_months<I>(&self, months: I) -> BatchResult
    where
        I: IntoIterator<Item = MonthKey>,
    {
        let names: Vec<&str> = self.requested.iter().map(|c| c.as_str()).collect();
        info!("Requested currencies: {:?} (base {})", names, self.base_currency);

        // Queried once per run; an unknown set means "assume everything is supported".
        let supported = self.primary.supported_currencies().await;
        if supported == SupportedCurrencies::Unknown {
            warn!("Primary source capabilities unknown, requesting all currencies from it first");
        }

        let mut result = BatchResult::default();

        for month in months {
            result.months_attempted += 1;
            info!("Processing {}...", month);

            match self.load_month(month, &supported).await {
                Ok(written) => {
                    result.total_rows += written;
                    result.succeeded_months.push(month);
                    info!("✅ Upserted {} currencies for {}", written, month);
                }
                Err(FxError::NoData(_)) => {
                    warn!("No FX rates found at all for {}, skipping.", month);
                    result.failed_months.push(month);
                }
                Err(e) => {
                    error!("❌ Failed to load {}: {}", month, e);
                    result.failed_months.push(month);
                }
            }
        }

        info!(
            "Batch finished: {} rows, {} months ok, {} failed",
            result.total_rows,
            result.succeeded_months.len(),
            result.failed_months.len()
        );
        result
    }

    /// Gather, aggregate and upsert a single month.
    pub async fn load_month(&self, month: MonthKey, supported: &SupportedCurrencies) -> Result<u64, FxError> {
        let merged = gather_month(
            self.primary.as_ref(),
            self.secondary.as_ref(),
            &self.requested,
            supported,
            month,
        )
        .await?;

        let rows = aggregate_month(month, &merged, &self.base_currency);
        self.store.upsert_monthly(&rows).await
    }

    /// Release the store's connection. Call once the run is over, whatever its outcome.
    pub async fn close(self) {
        self.store.close().await;
    }
}
