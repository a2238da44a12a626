//! SQLite store integration tests

use assert_matches::assert_matches;
use chrono::NaiveDate;
use fx_monthly::database::MonthlyRateStore;
use fx_monthly::error::FxError;
use fx_monthly::models::MonthlyRateRow;
use pretty_assertions::assert_eq;

use crate::common::database::init_memory_store;
use crate::common::logging;
use crate::common::test_data::cur;

fn row(code: &str, rate: f64, count: u32, source: &str) -> MonthlyRateRow {
    MonthlyRateRow {
        month_sk: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        currency_code: cur(code),
        avg_rate_to_base: rate,
        obs_count: count,
        source: source.to_string(),
    }
}

#[test_log::test(tokio::test)]
async fn test_upsert_is_idempotent() {
    logging::log_test_step("Testing repeated upserts of the same month");

    let store = init_memory_store().await;
    let rows = vec![
        row("DKK", 0.134, 22, "frankfurter"),
        row("EUR", 1.0, 1, "frankfurter"),
    ];

    assert_eq!(store.upsert_monthly(&rows).await.unwrap(), 2);
    let first = store.monthly_rows(rows[0].month_sk).await.unwrap();

    assert_eq!(store.upsert_monthly(&rows).await.unwrap(), 2);
    let second = store.monthly_rows(rows[0].month_sk).await.unwrap();

    assert_eq!(store.row_count().await.unwrap(), 2);
    assert_eq!(first, second);
    assert_eq!(second, rows);
}

#[test_log::test(tokio::test)]
async fn test_upsert_overwrites_non_key_columns() {
    let store = init_memory_store().await;

    store
        .upsert_monthly(&[row("COP", 0.00021, 10, "frankfurter")])
        .await
        .unwrap();
    store
        .upsert_monthly(&[row("COP", 0.00023, 21, "exchangerate.host")])
        .await
        .unwrap();

    let stored = store
        .monthly_rows(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap();
    assert_eq!(stored, vec![row("COP", 0.00023, 21, "exchangerate.host")]);
}

#[test_log::test(tokio::test)]
async fn test_failed_upsert_writes_nothing() {
    let store = init_memory_store().await;

    // The negative rate violates the table's CHECK constraint after DKK was inserted.
    let result = store
        .upsert_monthly(&[row("DKK", 0.134, 22, "frankfurter"), row("SEK", -1.0, 22, "frankfurter")])
        .await;

    assert_matches!(result, Err(FxError::Database(_)));
    assert_eq!(store.row_count().await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
async fn test_empty_upsert_is_a_no_op() {
    let store = init_memory_store().await;
    assert_eq!(store.upsert_monthly(&[]).await.unwrap(), 0);
    assert_eq!(store.row_count().await.unwrap(), 0);
}
