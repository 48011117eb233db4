//! Spot gold quotes from a GoldAPI-compatible endpoint.

use super::util::{get_json_with_deadline, http_client, join_url};
use crate::core::config::GoldApiProviderConfig;
use crate::core::error::FetchError;
use crate::core::price::PriceProvider;
use crate::core::snapshot::RawPayload;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, instrument};

const ACCESS_TOKEN_HEADER: &str = "x-access-token";
const QUOTE_PATH: &str = "XAU/USD";

pub struct GoldApiProvider {
    client: reqwest::Client,
    url: String,
    access_token: String,
    timeout: Duration,
}

impl GoldApiProvider {
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let client = http_client(timeout).context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: join_url(base_url, QUOTE_PATH),
            access_token: access_token.to_string(),
            timeout,
        })
    }

    /// Fails when no access token has been configured.
    pub fn from_config(config: &GoldApiProviderConfig, timeout: Duration) -> Result<Self> {
        let token = config
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No price API access token configured. Set providers.goldapi.access_token or {}",
                    crate::core::config::ENV_PRICE_API_TOKEN
                )
            })?;
        Self::new(&config.base_url, token, timeout)
    }
}

#[async_trait]
impl PriceProvider for GoldApiProvider {
    #[instrument(name = "GoldApiFetch", skip(self), fields(url = %self.url))]
    async fn fetch_once(&self) -> Result<RawPayload, FetchError> {
        debug!("Requesting gold price");
        let request = self
            .client
            .get(&self.url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-store");

        let payload: RawPayload = get_json_with_deadline(request, self.timeout).await?;
        debug!(price = ?payload.price, timestamp = ?payload.timestamp, "Received gold price");
        Ok(payload)
    }
}
