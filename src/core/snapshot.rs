//! Price data model: karats, the raw provider payload and the canonical snapshot.

use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Grams in one troy ounce.
pub const TROY_OUNCE_GRAMS: f64 = 31.1034768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Karat {
    #[serde(rename = "24k")]
    K24,
    #[serde(rename = "22k")]
    K22,
    #[serde(rename = "21k")]
    K21,
    #[serde(rename = "20k")]
    K20,
    #[serde(rename = "18k")]
    K18,
    #[serde(rename = "16k")]
    K16,
    #[serde(rename = "14k")]
    K14,
    #[serde(rename = "10k")]
    K10,
}

impl Karat {
    pub const ALL: [Karat; 8] = [
        Karat::K24,
        Karat::K22,
        Karat::K21,
        Karat::K20,
        Karat::K18,
        Karat::K16,
        Karat::K14,
        Karat::K10,
    ];

    pub fn value(&self) -> u8 {
        match self {
            Karat::K24 => 24,
            Karat::K22 => 22,
            Karat::K21 => 21,
            Karat::K20 => 20,
            Karat::K18 => 18,
            Karat::K16 => 16,
            Karat::K14 => 14,
            Karat::K10 => 10,
        }
    }

    /// Fraction of pure gold, `k / 24`.
    pub fn purity(&self) -> f64 {
        f64::from(self.value()) / 24.0
    }
}

impl Display for Karat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}K", self.value())
    }
}

impl TryFrom<u8> for Karat {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Karat::ALL
            .into_iter()
            .find(|k| k.value() == value)
            .ok_or_else(|| ValidationError::UnsupportedKarat(value.to_string()))
    }
}

impl FromStr for Karat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.trim_end_matches(['k', 'K']);
        digits
            .parse::<u8>()
            .map_err(|_| ValidationError::UnsupportedKarat(trimmed.to_string()))
            .and_then(|value| {
                Karat::try_from(value)
                    .map_err(|_| ValidationError::UnsupportedKarat(trimmed.to_string()))
            })
    }
}

/// Price provider body as received.
///
/// Providers disagree on field names, so every alias gets its own member and
/// the normalizer resolves them. Nothing here is trusted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPayload {
    pub timestamp: Option<i64>,
    pub price: Option<f64>,
    pub ch: Option<f64>,
    pub change: Option<f64>,
    pub chp: Option<f64>,
    pub change_pct: Option<f64>,
    pub open_price: Option<f64>,
    pub open: Option<f64>,
    pub high_price: Option<f64>,
    pub high: Option<f64>,
    pub low_price: Option<f64>,
    pub low: Option<f64>,
    pub price_gram_24k: Option<f64>,
    pub price_gram: Option<f64>,
    pub price_gram_22k: Option<f64>,
    pub price_gram_21k: Option<f64>,
    pub price_gram_20k: Option<f64>,
    pub price_gram_18k: Option<f64>,
    pub price_gram_16k: Option<f64>,
    pub price_gram_14k: Option<f64>,
    pub price_gram_10k: Option<f64>,
}

impl RawPayload {
    /// Directly supplied per-gram price for a karat, before any aliasing.
    pub fn supplied_per_gram(&self, karat: Karat) -> Option<f64> {
        match karat {
            Karat::K24 => self.price_gram_24k.or(self.price_gram),
            Karat::K22 => self.price_gram_22k,
            Karat::K21 => self.price_gram_21k,
            Karat::K20 => self.price_gram_20k,
            Karat::K18 => self.price_gram_18k,
            Karat::K16 => self.price_gram_16k,
            Karat::K14 => self.price_gram_14k,
            Karat::K10 => self.price_gram_10k,
        }
    }
}

impl From<&CanonicalPriceSnapshot> for RawPayload {
    fn from(snapshot: &CanonicalPriceSnapshot) -> Self {
        let gram = |karat| snapshot.per_gram_by_karat.get(&karat).copied();
        RawPayload {
            timestamp: Some(snapshot.timestamp_seconds),
            price: snapshot.spot_price_usd_per_ounce,
            ch: Some(snapshot.change_absolute_usd),
            chp: Some(snapshot.change_percent),
            open_price: snapshot.open_usd,
            high_price: snapshot.high_usd,
            low_price: snapshot.low_usd,
            price_gram_24k: gram(Karat::K24),
            price_gram_22k: gram(Karat::K22),
            price_gram_21k: gram(Karat::K21),
            price_gram_20k: gram(Karat::K20),
            price_gram_18k: gram(Karat::K18),
            price_gram_16k: gram(Karat::K16),
            price_gram_14k: gram(Karat::K14),
            price_gram_10k: gram(Karat::K10),
            ..Default::default()
        }
    }
}

/// Normalized price record. Replaced wholesale on every successful fetch,
/// never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPriceSnapshot {
    pub timestamp_seconds: i64,
    pub spot_price_usd_per_ounce: Option<f64>,
    pub change_absolute_usd: f64,
    pub change_percent: f64,
    pub open_usd: Option<f64>,
    pub high_usd: Option<f64>,
    pub low_usd: Option<f64>,
    /// USD per gram. Holds every tracked karat.
    pub per_gram_by_karat: BTreeMap<Karat, f64>,
}

impl CanonicalPriceSnapshot {
    pub fn per_gram(&self, karat: Karat) -> Option<f64> {
        self.per_gram_by_karat.get(&karat).copied()
    }

    pub fn sentiment(&self) -> Sentiment {
        Sentiment::from_change(self.change_absolute_usd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Sentiment::Bullish
        } else if change < 0.0 {
            Sentiment::Bearish
        } else {
            Sentiment::Neutral
        }
    }
}

impl Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Sentiment::Bullish => "Bullish",
                Sentiment::Bearish => "Bearish",
                Sentiment::Neutral => "Neutral",
            }
        )
    }
}
