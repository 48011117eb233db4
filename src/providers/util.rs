use crate::core::error::FetchError;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// User agent sent with every provider request.
pub const USER_AGENT: &str = concat!("goldtick/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client for a provider.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Sends a request and decodes its JSON body, all within `deadline`.
///
/// # Parameters
/// - `request`: Fully built request, not yet sent
/// - `deadline`: Hard limit covering connect, response and body read
///
/// # Returns
/// The decoded body, or the [`FetchError`] describing what went wrong. The
/// request is dropped, and with it the connection, once the deadline passes.
pub async fn get_json_with_deadline<T>(
    request: RequestBuilder,
    deadline: Duration,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    match tokio::time::timeout(deadline, send_and_decode(request)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(deadline_ms = deadline.as_millis() as u64, "Request aborted at deadline");
            Err(FetchError::Timeout)
        }
    }
}

async fn send_and_decode<T>(request: RequestBuilder) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let response = request.send().await.map_err(FetchError::from_transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(%status, body = %body, "Provider returned an error status");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let text = response.text().await.map_err(FetchError::from_transport)?;
    decode_object(&text).inspect_err(|e| {
        debug!(error = %e, response = %text, "Failed to parse provider response");
    })
}

/// Decodes a provider body. Only a top-level JSON object is accepted, so
/// arrays never fill struct fields positionally.
pub fn decode_object<T>(text: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| FetchError::InvalidPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(FetchError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| FetchError::InvalidPayload(e.to_string()))
}

/// Joins a base URL and a path without doubling slashes.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
