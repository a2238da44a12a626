//! Common test utilities and helpers

pub mod database;

/// Test data utilities
pub mod test_data {
    use fx_monthly::models::{CurrencyCode, DailyRateTable, MonthKey};
    use std::collections::BTreeMap;

    pub fn cur(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    pub fn codes(list: &[&str]) -> Vec<CurrencyCode> {
        list.iter().map(|c| cur(c)).collect()
    }

    pub fn month(year: i32, month: u32) -> MonthKey {
        MonthKey::new(year, month).unwrap()
    }

    /// The same rates on every calendar day of `month`.
    pub fn every_day(month: MonthKey, rates: &[(&str, f64)]) -> DailyRateTable {
        let (start, end) = month.window();
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| {
                let day: BTreeMap<CurrencyCode, f64> = rates.iter().map(|(c, r)| (cur(c), *r)).collect();
                (d.format("%Y-%m-%d").to_string(), day)
            })
            .collect()
    }

    /// Provider-style JSON body (`{"rates": {date: {code: rate}}}`) for `every_day`.
    pub fn rates_body(month: MonthKey, rates: &[(&str, f64)]) -> serde_json::Value {
        serde_json::json!({ "rates": every_day(month, rates) })
    }
}

/// Tracing helpers shared by the integration suite
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Route crate logs at debug level to the test writer; later calls are no-ops.
    pub fn init_test_logging() {
        INIT.call_once(|| {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter("fx_monthly=debug")
                .with_test_writer()
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        });
    }

    pub fn log_test_step(step: &str) {
        info!("🧪 {}", step);
    }

    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
