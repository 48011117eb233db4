//! Turns a raw provider payload into a [`CanonicalPriceSnapshot`].
//!
//! The 24k per-gram price anchors everything else: it is taken from the
//! payload when supplied, otherwise derived from the spot price per troy
//! ounce. Every other karat is filled in proportionally when missing. A
//! payload with neither source is rejected instead of producing a snapshot
//! full of holes.

use crate::core::error::NormalizationError;
use crate::core::snapshot::{CanonicalPriceSnapshot, Karat, RawPayload, TROY_OUNCE_GRAMS};
use std::collections::BTreeMap;

/// Normalizes against the current wall clock.
pub fn normalize(raw: &RawPayload) -> Result<CanonicalPriceSnapshot, NormalizationError> {
    normalize_at(raw, chrono::Utc::now().timestamp())
}

/// Normalizes with an explicit "now", used when the payload has no timestamp.
pub fn normalize_at(
    raw: &RawPayload,
    now_seconds: i64,
) -> Result<CanonicalPriceSnapshot, NormalizationError> {
    let spot = raw.price.filter(|p| usable(*p));

    let per_gram_24k = raw
        .supplied_per_gram(Karat::K24)
        .filter(|p| usable(*p))
        .or_else(|| spot.map(|s| s / TROY_OUNCE_GRAMS))
        .ok_or(NormalizationError::InsufficientData)?;

    let per_gram_by_karat: BTreeMap<Karat, f64> = Karat::ALL
        .into_iter()
        .map(|karat| {
            let value = match karat {
                Karat::K24 => per_gram_24k,
                _ => raw
                    .supplied_per_gram(karat)
                    .filter(|p| usable(*p))
                    .unwrap_or(per_gram_24k * karat.purity()),
            };
            (karat, value)
        })
        .collect();

    Ok(CanonicalPriceSnapshot {
        timestamp_seconds: raw.timestamp.filter(|ts| *ts > 0).unwrap_or(now_seconds),
        spot_price_usd_per_ounce: spot,
        change_absolute_usd: raw.ch.or(raw.change).unwrap_or(0.0),
        change_percent: raw.chp.or(raw.change_pct).unwrap_or(0.0),
        open_usd: raw.open_price.or(raw.open),
        high_usd: raw.high_price.or(raw.high),
        low_usd: raw.low_price.or(raw.low),
        per_gram_by_karat,
    })
}

// Zero, negative and non-finite prices count as absent.
fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
