//! HTTP client tests against a local mock provider

use assert_matches::assert_matches;
use fx_monthly::api::{
    ExchangeRateHostClient, FrankfurterClient, PrimaryRateSource, SecondaryRateSource, SupportedCurrencies,
};
use fx_monthly::error::SourceError;
use fx_monthly::models::SourceConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::test_data::{codes, cur, month, rates_body};

fn source_config(server: &MockServer) -> SourceConfig {
    SourceConfig::new(&server.uri())
        .unwrap()
        .with_timeout(Duration::from_secs(5))
}

#[test_log::test(tokio::test)]
async fn test_frankfurter_fetches_month_window() {
    let server = MockServer::start().await;
    let jan = month(2024, 1);

    Mock::given(method("GET"))
        .and(path("/2024-01-01..2024-01-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rates_body(jan, &[("DKK", 7.45), ("SEK", 11.2)])))
        .expect(1)
        .mount(&server)
        .await;

    let client = FrankfurterClient::new(&source_config(&server)).unwrap();
    let table = client.fetch_month(jan).await;

    assert_eq!(table.len(), 31);
    assert_eq!(table["2024-01-15"][&cur("SEK")], 11.2);
}

#[test_log::test(tokio::test)]
async fn test_frankfurter_server_error_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = FrankfurterClient::new(&source_config(&server)).unwrap();

    assert_matches!(
        client.try_fetch_month(month(2024, 2)).await,
        Err(SourceError::Status { status: 500, body }) if body == "upstream down"
    );
    assert!(client.fetch_month(month(2024, 2)).await.is_empty());
    assert_eq!(client.supported_currencies().await, SupportedCurrencies::Unknown);
}

#[test_log::test(tokio::test)]
async fn test_frankfurter_supported_currencies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/currencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DKK": "Danish Krone",
            "EUR": "Euro",
            "SEK": "Swedish Krona"
        })))
        .mount(&server)
        .await;

    let client = FrankfurterClient::new(&source_config(&server)).unwrap();

    assert_eq!(
        client.supported_currencies().await,
        SupportedCurrencies::Known(codes(&["DKK", "EUR", "SEK"]).into_iter().collect())
    );
}

#[test_log::test(tokio::test)]
async fn test_frankfurter_malformed_body_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = FrankfurterClient::new(&source_config(&server)).unwrap();
    assert!(client.fetch_month(month(2024, 1)).await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_exchangerate_host_sends_timeseries_query() {
    let server = MockServer::start().await;
    let feb = month(2024, 2);

    Mock::given(method("GET"))
        .and(path("/timeseries"))
        .and(query_param("start_date", "2024-02-01"))
        .and(query_param("end_date", "2024-02-29"))
        .and(query_param("base", "EUR"))
        .and(query_param("symbols", "COP,RSD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "timeseries": true,
            "base": "EUR",
            "rates": {
                "2024-02-01": { "COP": 4250.0, "RSD": 117.1 },
                "2024-02-02": { "COP": 4260.0 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ExchangeRateHostClient::new(&source_config(&server), cur("EUR")).unwrap();
    let table = client.fetch_month(feb, &codes(&["COP", "RSD"])).await;

    assert_eq!(table.len(), 2);
    assert_eq!(table["2024-02-01"][&cur("RSD")], 117.1);
    assert_eq!(table["2024-02-02"].len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_exchangerate_host_passes_access_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/timeseries"))
        .and(query_param("access_key", "k-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rates_body(month(2024, 3), &[("COP", 4300.0)])))
        .expect(1)
        .mount(&server)
        .await;

    let config = source_config(&server).with_access_key(Some("k-123".to_string()));
    let client = ExchangeRateHostClient::new(&config, cur("EUR")).unwrap();

    assert_eq!(client.fetch_month(month(2024, 3), &codes(&["COP"])).await.len(), 31);
}

#[test_log::test(tokio::test)]
async fn test_exchangerate_host_provider_error_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/timeseries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": { "code": 101, "type": "missing_access_key" }
        })))
        .mount(&server)
        .await;

    let client = ExchangeRateHostClient::new(&source_config(&server), cur("EUR")).unwrap();

    assert_matches!(
        client.try_fetch_month(month(2024, 1), &codes(&["COP"])).await,
        Err(SourceError::Provider(_))
    );
    assert!(client.fetch_month(month(2024, 1), &codes(&["COP"])).await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_exchangerate_host_skips_request_without_symbols() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rates": {} })))
        .expect(0)
        .mount(&server)
        .await;

    let client = ExchangeRateHostClient::new(&source_config(&server), cur("EUR")).unwrap();
    assert!(client.fetch_month(month(2024, 1), &[]).await.is_empty());
}
