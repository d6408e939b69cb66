//! Decimal ↔ f64 conversions for the NUMERIC forecast columns.
//!
//! Measurements are stored at one decimal place (0.1 ft, 0.1 mph, 0.1°).
//! Non-finite inputs become `Decimal::ZERO` with a warning.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert an f64 to Decimal, rounded to 1 decimal place.
pub(crate) fn f64_to_decimal_1dp(v: f64) -> Decimal {
    if !v.is_finite() {
        tracing::warn!(
            "f64_to_decimal_1dp received non-finite value {}, storing 0",
            v
        );
        return Decimal::ZERO;
    }
    Decimal::from_str_exact(&format!("{:.1}", v)).unwrap_or_default()
}

pub(crate) fn opt_f64_to_decimal_1dp(v: Option<f64>) -> Option<Decimal> {
    v.map(f64_to_decimal_1dp)
}

/// Convert a Decimal to f64, defaulting to 0.0 for values that can't be represented.
pub(crate) fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

pub(crate) fn opt_dec_to_f64(d: Option<Decimal>) -> Option<f64> {
    d.and_then(|v| v.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_breaking_height_rounds_to_tenth_of_a_foot() {
        assert_eq!(f64_to_decimal_1dp(4.26), Decimal::from_str("4.3").unwrap());
        assert_eq!(f64_to_decimal_1dp(4.24), Decimal::from_str("4.2").unwrap());
    }

    #[test]
    fn test_negative_tide_keeps_sign() {
        assert_eq!(f64_to_decimal_1dp(-0.87), Decimal::from_str("-0.9").unwrap());
    }

    #[test]
    fn test_non_finite_becomes_zero() {
        assert_eq!(f64_to_decimal_1dp(f64::NAN), Decimal::ZERO);
        assert_eq!(f64_to_decimal_1dp(f64::INFINITY), Decimal::ZERO);
        assert_eq!(f64_to_decimal_1dp(f64::NEG_INFINITY), Decimal::ZERO);
    }

    #[test]
    fn test_optional_wind_speed() {
        assert_eq!(opt_f64_to_decimal_1dp(None), None);
        assert_eq!(
            opt_f64_to_decimal_1dp(Some(12.04)),
            Some(Decimal::from_str("12.0").unwrap())
        );
    }

    #[test]
    fn test_back_to_f64() {
        let d = Decimal::from_str("3.4").unwrap();
        assert!((dec_to_f64(d) - 3.4).abs() < 1e-10);
        assert_eq!(dec_to_f64(Decimal::ZERO), 0.0);
        assert_eq!(opt_dec_to_f64(None), None);
        assert!((opt_dec_to_f64(Some(d)).unwrap() - 3.4).abs() < 1e-10);
    }
}
