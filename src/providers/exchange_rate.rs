//! USD-based exchange rates from an exchangerate.host-style `latest` endpoint.
//!
//! Callers always get a table back. Any failure is logged and answered with
//! the static fallback rates, flagged as such.

use super::util::{get_json_with_deadline, http_client, join_url};
use crate::core::config::FxProviderConfig;
use crate::core::currency::{FxRateProvider, FxTable, USD};
use crate::core::error::FxError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

pub struct ExchangeRateProvider {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl ExchangeRateProvider {
    pub fn new(base_url: &str, symbols: &[String], timeout: Duration) -> Result<Self> {
        let client = http_client(timeout).context("Failed to build HTTP client")?;
        let url = format!(
            "{}?symbols={}&base={USD}",
            join_url(base_url, "latest"),
            symbols.join(",")
        );
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn from_config(config: &FxProviderConfig, timeout: Duration) -> Result<Self> {
        Self::new(&config.base_url, &config.symbols, timeout)
    }

    async fn try_fetch(&self) -> Result<FxTable, FxError> {
        let response: LatestRatesResponse =
            get_json_with_deadline(self.client.get(&self.url), self.timeout).await?;

        let rates: BTreeMap<String, f64> = response
            .rates
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();

        if rates.is_empty() {
            return Err(FxError::EmptyRates);
        }

        let base = response.base.unwrap_or_else(|| USD.to_string());
        Ok(FxTable::new(&base, rates, false))
    }
}

#[async_trait]
impl FxRateProvider for ExchangeRateProvider {
    #[instrument(name = "FxFetch", skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> FxTable {
        match self.try_fetch().await {
            Ok(table) => {
                debug!(base = %table.base_currency, count = table.rates.len(), "Received FX rates");
                table
            }
            Err(e) => {
                warn!(error = %e, "FX fetch failed; using fallback rates");
                FxTable::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::default_symbols;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("base", "USD"))
            .and(query_param("symbols", "USD,AED,INR,EUR,GBP,CNY,SAR,AUD,CAD,PKR"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(server: &MockServer, timeout: Duration) -> ExchangeRateProvider {
        ExchangeRateProvider::new(&server.uri(), &default_symbols(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let body = r#"{"base": "USD", "rates": {"USD": 1, "EUR": 0.91, "INR": 83.2}}"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let fx = provider(&server, Duration::from_secs(5)).fetch_rates().await;
        assert!(!fx.is_fallback);
        assert_eq!(fx.base_currency, "USD");
        assert_eq!(fx.rate("EUR"), Some(0.91));
        assert_eq!(fx.rate("INR"), Some(83.2));
        assert_eq!(fx.rate("USD"), Some(1.0));
    }

    #[tokio::test]
    async fn test_missing_base_defaults_to_usd() {
        let body = r#"{"rates": {"GBP": 0.8}}"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let fx = provider(&server, Duration::from_secs(5)).fetch_rates().await;
        assert_eq!(fx.base_currency, "USD");
        assert_eq!(fx.rate("USD"), Some(1.0));
        assert!(!fx.is_fallback);
    }

    #[tokio::test]
    async fn test_empty_rates_falls_back() {
        let body = r#"{"base": "USD", "rates": {}}"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let fx = provider(&server, Duration::from_secs(5)).fetch_rates().await;
        assert!(fx.is_fallback);
        assert_eq!(fx.rates, FxTable::fallback().rates);
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let server = create_mock_server(ResponseTemplate::new(503)).await;
        let fx = provider(&server, Duration::from_secs(5)).fetch_rates().await;
        assert_eq!(fx, FxTable::fallback());
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back() {
        let server =
            create_mock_server(ResponseTemplate::new(200).set_body_string("not json")).await;
        let fx = provider(&server, Duration::from_secs(5)).fetch_rates().await;
        assert!(fx.is_fallback);
    }

    #[tokio::test]
    async fn test_array_body_falls_back() {
        let server = create_mock_server(
            ResponseTemplate::new(200).set_body_string(r#"["USD", {"EUR": 0.9}]"#),
        )
        .await;
        let provider = provider(&server, Duration::from_secs(5));
        assert!(matches!(
            provider.try_fetch().await,
            Err(FxError::InvalidPayload(_))
        ));
        assert!(provider.fetch_rates().await.is_fallback);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let server = create_mock_server(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"base": "USD", "rates": {"EUR": 0.9}}"#)
                .set_delay(Duration::from_millis(500)),
        )
        .await;
        let fx = provider(&server, Duration::from_millis(50)).fetch_rates().await;
        assert!(fx.is_fallback);
    }

    #[tokio::test]
    async fn test_try_fetch_reports_empty_rates() {
        let server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(r#"{"base":"USD"}"#))
                .await;
        let err = provider(&server, Duration::from_secs(5))
            .try_fetch()
            .await
            .unwrap_err();
        assert_eq!(err, FxError::EmptyRates);
    }
}
