use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FxError;
use crate::utils::month_range;

pub mod config;
pub mod currency;

pub use config::{Config, DatabaseSettings, SourceConfig};
pub use currency::{country_currency, requested_currencies, BASE_CURRENCY};

/// Three-letter uppercase currency code such as `EUR` or `DKK`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self, FxError> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(FxError::InvalidCurrency(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A calendar month. Its canonical identifier (`month_sk`) is the first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, FxError> {
        let (start, end) = month_range(year, month)?;
        Ok(Self { year, month, start, end })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn month_sk(&self) -> NaiveDate {
        self.start
    }

    /// Inclusive (first day, last day) window.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }

    /// Every month of every year in `start_year..=end_year`, in chronological order.
    pub fn year_range(start_year: i32, end_year: i32) -> impl Iterator<Item = MonthKey> {
        (start_year..=end_year)
            .flat_map(|year| (1..=12).filter_map(move |month| MonthKey::new(year, month).ok()))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Date (ISO `YYYY-MM-DD`) -> currency -> rate, where `1 base = rate × currency`.
pub type DailyRateTable = BTreeMap<String, BTreeMap<CurrencyCode, f64>>;

/// Merged rates for one month plus the label of the source that supplied each currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedRates {
    pub rates: DailyRateTable,
    pub provenance: BTreeMap<CurrencyCode, String>,
}

impl MergedRates {
    /// True when neither source returned any date.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn observation_count(&self) -> usize {
        self.rates.values().map(|day| day.len()).sum()
    }
}

/// One persisted row: the monthly average of a currency, `1 currency = avg_rate_to_base × base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRateRow {
    pub month_sk: NaiveDate,
    pub currency_code: CurrencyCode,
    pub avg_rate_to_base: f64,
    pub obs_count: u32,
    pub source: String,
}

/// Outcome of one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub total_rows: u64,
    pub months_attempted: usize,
    pub succeeded_months: Vec<MonthKey>,
    pub failed_months: Vec<MonthKey>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.failed_months.is_empty()
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==================== SUMMARY ====================")?;
        writeln!(f, "Months processed: {}", self.months_attempted)?;
        writeln!(f, "Total upserted rows: {}", self.total_rows)?;
        if self.failed_months.is_empty() {
            write!(f, "All months processed successfully.")
        } else {
            write!(f, "Months that failed or were skipped:")?;
            for month in &self.failed_months {
                write!(f, "\n - {}", month)?;
            }
            Ok(())
        }
    }
}
