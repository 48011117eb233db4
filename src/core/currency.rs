//! Exchange-rate tables and currency conversion

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

pub const USD: &str = "USD";

/// Static USD-based rates served when the live provider is unavailable.
const FALLBACK_RATES: [(&str, f64); 10] = [
    ("USD", 1.0),
    ("AED", 3.6725),
    ("INR", 84.0),
    ("EUR", 0.93),
    ("GBP", 0.79),
    ("CNY", 7.10),
    ("SAR", 3.75),
    ("AUD", 1.51),
    ("CAD", 1.37),
    ("PKR", 279.0),
];

/// Currency codes requested from the live provider by default.
pub fn default_symbols() -> Vec<String> {
    FALLBACK_RATES
        .iter()
        .map(|(code, _)| code.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FxTable {
    pub base_currency: String,
    /// Multipliers relative to `base_currency`.
    pub rates: BTreeMap<String, f64>,
    pub is_fallback: bool,
}

impl FxTable {
    /// Builds a table, pinning the base currency's own rate to 1.
    pub fn new(base_currency: &str, mut rates: BTreeMap<String, f64>, is_fallback: bool) -> Self {
        let base_currency = base_currency.to_uppercase();
        rates.insert(base_currency.clone(), 1.0);
        Self {
            base_currency,
            rates,
            is_fallback,
        }
    }

    pub fn fallback() -> Self {
        let rates = FALLBACK_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect();
        Self::new(USD, rates, true)
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    /// Whether [`convert`] can actually reach `target` instead of falling back to USD.
    pub fn can_convert(&self, target: &str) -> bool {
        if target == self.base_currency {
            return true;
        }
        self.rate(target).is_some() && (self.base_currency == USD || self.rate(USD).is_some())
    }

    /// Human readable provenance of the rates.
    pub fn provenance_note(&self) -> String {
        if self.is_fallback {
            "Converted using fallback FX rates (approx).".to_string()
        } else {
            format!("Converted from {} via live FX.", self.base_currency)
        }
    }
}

/// Converts a USD amount into `target`.
///
/// A missing rate leaves the amount in USD rather than failing.
pub fn convert(amount_usd: f64, target: &str, fx: &FxTable) -> f64 {
    if target == fx.base_currency {
        return amount_usd;
    }

    if fx.base_currency == USD {
        return fx.rate(target).map_or(amount_usd, |r| amount_usd * r);
    }

    match (fx.rate(target), fx.rate(USD)) {
        (Some(target_rate), Some(usd_rate)) if usd_rate != 0.0 => {
            amount_usd * (target_rate / usd_rate)
        }
        _ => amount_usd,
    }
}

/// Source of exchange rates. Implementations degrade to
/// [`FxTable::fallback`] instead of returning errors.
#[async_trait]
pub trait FxRateProvider: Send + Sync {
    async fn fetch_rates(&self) -> FxTable;
}
