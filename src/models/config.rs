use std::time::Duration;
use url::Url;

use super::currency::{normalize_country_code, requested_currencies, BASE_CURRENCY};
use super::{CurrencyCode, MonthKey};
use crate::error::FxError;

const DEFAULT_START_YEAR: i32 = 2024;
const DEFAULT_END_YEAR: i32 = 2025;
const DEFAULT_COUNTRIES: &str = "BG,CO,DK,ES,FI,HR,HU,IT,LT,NO,PL,RO,RS,SE";
const DEFAULT_PRIMARY_URL: &str = "https://api.frankfurter.app";
const DEFAULT_SECONDARY_URL: &str = "https://api.exchangerate.host";
const DEFAULT_TABLE: &str = "warehouse.fx_rates_monthly";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection details for one rate provider.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub access_key: Option<String>,
    pub timeout: Duration,
}

impl SourceConfig {
    pub fn new(base_url: &str) -> Result<Self, FxError> {
        Url::parse(base_url)
            .map_err(|e| FxError::Config(format!("invalid provider URL {:?}: {}", base_url, e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_access_key(mut self, access_key: Option<String>) -> Self {
        self.access_key = access_key.filter(|k| !k.is_empty());
        self
    }
}

/// Storage connection parameters. `url` wins over the individual fields.
#[derive(Debug, Clone, Default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DatabaseSettings {
    pub fn is_sqlite(&self) -> bool {
        self.url.as_deref().map_or(false, |url| url.starts_with("sqlite:"))
    }
}

/// Configuration for a load run
#[derive(Debug, Clone)]
pub struct Config {
    pub start_year: i32,
    pub end_year: i32,
    pub country_codes: Vec<String>,
    pub base_currency: CurrencyCode,
    pub primary: SourceConfig,
    pub secondary: SourceConfig,
    pub database: DatabaseSettings,
    pub table_name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, FxError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same parsing as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let start_year = parse_var(var("FX_START_YEAR"), "FX_START_YEAR", DEFAULT_START_YEAR)?;
        let end_year = parse_var(var("FX_END_YEAR"), "FX_END_YEAR", DEFAULT_END_YEAR)?;
        let timeout = Duration::from_secs(parse_var(
            var("FX_HTTP_TIMEOUT_SECS"),
            "FX_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);

        let primary = SourceConfig::new(&var("FX_PRIMARY_URL").unwrap_or_else(|| DEFAULT_PRIMARY_URL.to_string()))?
            .with_timeout(timeout);
        let secondary =
            SourceConfig::new(&var("FX_SECONDARY_URL").unwrap_or_else(|| DEFAULT_SECONDARY_URL.to_string()))?
                .with_timeout(timeout)
                .with_access_key(var("FX_SECONDARY_ACCESS_KEY"));

        let table_name = var("FX_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());
        validate_table_name(&table_name)?;

        let database = DatabaseSettings {
            url: var("DATABASE_URL"),
            host: var("PGHOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_var(var("PGPORT"), "PGPORT", 5432)?,
            database: var("PGDATABASE"),
            user: var("PGUSER"),
            password: lookup("PGPASSWORD"),
        };

        let config = Config {
            start_year,
            end_year,
            country_codes: parse_country_list(&var("FX_COUNTRIES").unwrap_or_else(|| DEFAULT_COUNTRIES.to_string())),
            base_currency: CurrencyCode::new(BASE_CURRENCY)?,
            primary,
            secondary,
            database,
            table_name,
        };
        config.validate_years()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        start_year: Option<i32>,
        end_year: Option<i32>,
        countries: Option<&str>,
    ) -> Result<Self, FxError> {
        if let Some(year) = start_year {
            self.start_year = year;
        }
        if let Some(year) = end_year {
            self.end_year = year;
        }
        if let Some(list) = countries {
            self.country_codes = parse_country_list(list);
        }
        self.validate_years()?;
        Ok(self)
    }

    /// Non-base currencies needed for the configured countries.
    pub fn requested_currencies(&self) -> Vec<CurrencyCode> {
        requested_currencies(&self.country_codes, &self.base_currency)
    }

    fn validate_years(&self) -> Result<(), FxError> {
        for (year, month) in [(self.start_year, 1), (self.end_year, 12)] {
            MonthKey::new(year, month)
                .map_err(|_| FxError::Config(format!("year {} is outside the supported calendar range", year)))?;
        }
        if self.start_year > self.end_year {
            return Err(FxError::Config(format!(
                "start year {} is after end year {}",
                self.start_year, self.end_year
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, FxError> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| FxError::Config(format!("{} must be a number, got {:?}", key, raw))),
        None => Ok(default),
    }
}

fn parse_country_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|c| !c.trim().is_empty())
        .map(normalize_country_code)
        .collect()
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted.
fn validate_table_name(name: &str) -> Result<(), FxError> {
    let valid = name.split('.').count() <= 2
        && name.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(FxError::Config(format!("invalid table name {:?}", name)))
    }
}
