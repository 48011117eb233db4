//! Weight and value arithmetic over a snapshot.

use crate::core::currency::{FxTable, convert};
use crate::core::error::ValidationError;
use crate::core::snapshot::{CanonicalPriceSnapshot, Karat, TROY_OUNCE_GRAMS};

/// Converts `weight` in `unit` to grams. Unknown units pass through unchanged.
pub fn to_grams(weight: f64, unit: &str) -> f64 {
    match unit {
        "g" => weight,
        "kg" => weight * 1000.0,
        "oz" => weight * TROY_OUNCE_GRAMS,
        _ => weight,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub karat: Karat,
    pub grams: f64,
    pub per_gram_usd: f64,
    /// Per-gram price in the requested currency.
    pub per_gram: f64,
    /// Total value in the requested currency.
    pub total: f64,
    pub currency: String,
}

/// Rejects zero, negative and NaN weights.
pub fn validate_weight(weight: f64) -> Result<(), ValidationError> {
    if weight.is_nan() || weight <= 0.0 {
        return Err(ValidationError::NonPositiveWeight);
    }
    Ok(())
}

/// Prices a quantity of gold of the given karat in `currency`.
pub fn compute_total(
    karat: Karat,
    weight: f64,
    unit: &str,
    currency: &str,
    snapshot: &CanonicalPriceSnapshot,
    fx: &FxTable,
) -> Result<Calculation, ValidationError> {
    validate_weight(weight)?;

    let grams = to_grams(weight, unit);
    let per_gram_usd = per_gram_usd(karat, snapshot)?;

    Ok(Calculation {
        karat,
        grams,
        per_gram_usd,
        per_gram: convert(per_gram_usd, currency, fx),
        total: convert(grams * per_gram_usd, currency, fx),
        currency: currency.to_string(),
    })
}

fn per_gram_usd(karat: Karat, snapshot: &CanonicalPriceSnapshot) -> Result<f64, ValidationError> {
    snapshot
        .per_gram(karat)
        .or_else(|| {
            snapshot
                .spot_price_usd_per_ounce
                .map(|spot| spot / TROY_OUNCE_GRAMS * karat.purity())
        })
        .ok_or(ValidationError::NoPriceAvailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize_at;
    use crate::core::snapshot::RawPayload;
    use std::collections::BTreeMap;

    fn snapshot() -> CanonicalPriceSnapshot {
        let raw = RawPayload {
            price: Some(2000.0),
            timestamp: Some(1_700_000_000),
            ..Default::default()
        };
        normalize_at(&raw, 0).unwrap()
    }

    #[test]
    fn test_to_grams() {
        assert!((to_grams(1.0, "oz") - 31.1034768).abs() < 1e-12);
        assert_eq!(to_grams(2.0, "kg"), 2000.0);
        assert_eq!(to_grams(7.5, "g"), 7.5);
        assert_eq!(to_grams(3.0, "tola"), 3.0);
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let fx = FxTable::fallback();
        for weight in [0.0, -1.0, f64::NAN] {
            assert_eq!(
                compute_total(Karat::K24, weight, "g", "USD", &snapshot(), &fx).unwrap_err(),
                ValidationError::NonPositiveWeight
            );
        }
        assert!(validate_weight(0.001).is_ok());
    }

    #[test]
    fn test_total_in_usd() {
        let fx = FxTable::fallback();
        let calc = compute_total(Karat::K18, 10.0, "g", "USD", &snapshot(), &fx).unwrap();
        let expected_per_gram = 2000.0 / TROY_OUNCE_GRAMS * 0.75;
        assert!((calc.per_gram_usd - expected_per_gram).abs() < 1e-9);
        assert!((calc.total - 10.0 * expected_per_gram).abs() < 1e-9);
        assert_eq!(calc.grams, 10.0);
    }

    #[test]
    fn test_total_converted_with_ounces() {
        let fx = FxTable::fallback();
        let calc = compute_total(Karat::K24, 1.0, "oz", "AED", &snapshot(), &fx).unwrap();
        assert!((calc.total - 2000.0 * 3.6725).abs() < 1e-6);
        assert!((calc.per_gram - calc.per_gram_usd * 3.6725).abs() < 1e-9);
        assert_eq!(calc.currency, "AED");
    }

    #[test]
    fn test_karat_missing_from_map_derives_from_spot() {
        let mut snap = snapshot();
        snap.per_gram_by_karat.remove(&Karat::K14);
        let fx = FxTable::fallback();
        let calc = compute_total(Karat::K14, 1.0, "g", "USD", &snap, &fx).unwrap();
        assert!((calc.per_gram_usd - 2000.0 / TROY_OUNCE_GRAMS * 14.0 / 24.0).abs() < 1e-9);

        snap.spot_price_usd_per_ounce = None;
        snap.per_gram_by_karat = BTreeMap::new();
        assert_eq!(
            compute_total(Karat::K14, 1.0, "g", "USD", &snap, &fx).unwrap_err(),
            ValidationError::NoPriceAvailable
        );
    }
}
