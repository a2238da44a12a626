use thiserror::Error;

use crate::models::MonthKey;

/// Errors raised by the loader and its collaborators.
#[derive(Error, Debug)]
pub enum FxError {
    #[error("invalid month {month} for year {year}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no FX rates found at all for {0}")]
    NoData(MonthKey),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures inside a rate source client. These never cross the client's
/// trait boundary; callers of the traits only ever see degraded results.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider reported an error: {0}")]
    Provider(String),
}
