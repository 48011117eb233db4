//! Error types for the polling core.
//!
//! Provider and normalization failures are recovered by the scheduler through
//! backoff. Validation failures go straight back to whoever asked for a
//! calculation. None of them are fatal.

use thiserror::Error;

/// Failure of a single price fetch attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request did not complete before its deadline and was aborted.
    #[error("Request timed out")]
    Timeout,

    /// The connection could not be established or broke mid-request.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-2xx status.
    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    /// The body was not the JSON object we expect.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl FetchError {
    /// Maps a transport-level reqwest error onto the fetch taxonomy.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            FetchError::InvalidPayload(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    /// Neither a per-gram 24k price nor a spot price was present.
    #[error("Payload has no spot price and no 24k per-gram price")]
    InsufficientData,
}

/// Failure of an exchange-rate fetch. Never leaves the FX provider; it is
/// logged and replaced by the fallback table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    #[error("FX request timed out")]
    Timeout,

    #[error("FX network error: {0}")]
    Network(String),

    #[error("FX API error: {0}")]
    HttpStatus(u16),

    #[error("Invalid FX payload: {0}")]
    InvalidPayload(String),

    #[error("FX provider returned no rates")]
    EmptyRates,
}

impl From<FetchError> for FxError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => FxError::Timeout,
            FetchError::Network(msg) => FxError::Network(msg),
            FetchError::HttpStatus(code) => FxError::HttpStatus(code),
            FetchError::InvalidPayload(msg) => FxError::InvalidPayload(msg),
        }
    }
}

/// Rejected calculator input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Enter a valid weight.")]
    NonPositiveWeight,

    #[error("Unsupported karat: {0}")]
    UnsupportedKarat(String),

    #[error("No price available for the requested karat")]
    NoPriceAvailable,
}

/// Anything that makes one polling iteration unsuccessful. This is what the
/// backoff controller records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::HttpStatus(503).to_string(), "HTTP error: 503");
        assert_eq!(FetchError::Timeout.to_string(), "Request timed out");
    }

    #[test]
    fn test_poll_error_is_transparent() {
        let err: PollError = NormalizationError::InsufficientData.into();
        assert_eq!(
            err.to_string(),
            "Payload has no spot price and no 24k per-gram price"
        );
        let err: PollError = FetchError::Timeout.into();
        assert_eq!(err.to_string(), "Request timed out");
    }

    #[test]
    fn test_fx_error_from_fetch_error() {
        assert_eq!(FxError::from(FetchError::HttpStatus(404)), FxError::HttpStatus(404));
        assert_eq!(FxError::from(FetchError::Timeout), FxError::Timeout);
    }
}
