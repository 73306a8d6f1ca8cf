use ruint::aliases::U256;
use thiserror::Error;

/// Minimal-unit amount sent upstream when the caller is only probing price.
/// Never valid for execution; see the quote path for the single call site.
pub const PRICE_PROBE_MINIMAL_UNITS: &str = "1";

#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    #[error("Amount is not a non-negative decimal number: {0}")]
    Invalid(String),

    #[error("Amount does not fit in 256 bits after scaling")]
    Overflow,
}

/// Converts a human decimal-string amount into an integer minimal-unit
/// string (`"1.5"` with 6 decimals becomes `"1500000"`).
///
/// Arithmetic is exact `U256`; fraction digits past the token's precision
/// are dropped, rounding toward zero so the result never exceeds what the
/// caller authorized.
pub fn to_minimal_units(amount: &str, decimals: u8) -> Result<String, AmountError> {
    let amount = amount.trim();
    let (integer_part, fraction_part) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };
    if integer_part.is_empty() && fraction_part.is_empty() {
        return Err(AmountError::Invalid(amount.to_string()));
    }

    if !fraction_part.is_empty() && !fraction_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(amount.to_string()));
    }
    let kept_fraction = &fraction_part[..fraction_part.len().min(decimals as usize)];

    let integer_value = parse_digits(integer_part, amount)?
        .checked_mul(pow10(decimals)?)
        .ok_or(AmountError::Overflow)?;

    let fraction_value = if kept_fraction.is_empty() {
        U256::ZERO
    } else {
        parse_digits(kept_fraction, amount)?
            .checked_mul(pow10(decimals - kept_fraction.len() as u8)?)
            .ok_or(AmountError::Overflow)?
    };

    let total = integer_value.checked_add(fraction_value).ok_or(AmountError::Overflow)?;
    Ok(total.to_string())
}

/// True when the amount is absent, empty or zero-valued, i.e. the request is
/// a price probe rather than an execution.
pub fn is_price_probe(amount: Option<&str>) -> bool {
    match amount {
        Some(value) => {
            let value = value.trim();
            value.is_empty() || value.bytes().all(|b| matches!(b, b'0' | b'.'))
        }
        None => true,
    }
}

fn parse_digits(digits: &str, original: &str) -> Result<U256, AmountError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(original.to_string()));
    }
    U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow)
}

fn pow10(exponent: u8) -> Result<U256, AmountError> {
    U256::from(10u8).checked_pow(U256::from(exponent)).ok_or(AmountError::Overflow)
}

#[cfg(test)]
mod tests {
    use crate::amount::{is_price_probe, to_minimal_units, AmountError};

    #[test]
    fn test_scales_by_token_decimals() {
        assert_eq!(to_minimal_units("1.5", 6).unwrap(), "1500000");
        assert_eq!(to_minimal_units("0.000001", 6).unwrap(), "1");
        assert_eq!(to_minimal_units("123", 0).unwrap(), "123");
        assert_eq!(to_minimal_units("1", 18).unwrap(), "1000000000000000000");
        assert_eq!(to_minimal_units(".5", 2).unwrap(), "50");
    }

    #[test]
    fn test_truncates_toward_zero() {
        // Never request more than the user authorized
        assert_eq!(to_minimal_units("1.9999999", 6).unwrap(), "1999999");
        assert_eq!(to_minimal_units("0.00000049", 6).unwrap(), "0");
    }

    #[test]
    fn test_no_precision_loss_at_high_decimal_counts() {
        assert_eq!(
            to_minimal_units("1.123456789012345678", 18).unwrap(),
            "1123456789012345678"
        );
        assert_eq!(
            to_minimal_units("0.123456789012345678901234567890", 30).unwrap(),
            "123456789012345678901234567890"
        );
        // Large magnitude stays exact where f64 would drift
        assert_eq!(
            to_minimal_units("123456789012345678.9", 18).unwrap(),
            "123456789012345678900000000000000000"
        );
    }

    #[test]
    fn test_rescaling_reconstructs_within_one_minimal_unit() {
        // 7.25 truncated to d digits then rescaled differs from 7.25 by less
        // than one minimal unit, for every supported decimal count.
        for decimals in 0u8..=30 {
            let minimal = to_minimal_units("7.25", decimals).unwrap();
            let expected = match decimals {
                0 => "7".to_string(),
                1 => "72".to_string(),
                d => format!("725{}", "0".repeat(d as usize - 2)),
            };
            assert_eq!(minimal, expected, "decimals={}", decimals);
        }
    }

    #[test]
    fn test_rejects_malformed_amounts() {
        assert_eq!(to_minimal_units("", 6), Err(AmountError::Invalid("".to_string())));
        assert_eq!(to_minimal_units(".", 6), Err(AmountError::Invalid(".".to_string())));
        assert!(matches!(to_minimal_units("-1", 6), Err(AmountError::Invalid(_))));
        assert!(matches!(to_minimal_units("1e5", 6), Err(AmountError::Invalid(_))));
        assert!(matches!(to_minimal_units("1.5.6", 6), Err(AmountError::Invalid(_))));
        assert!(matches!(to_minimal_units("0x10", 6), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn test_rejects_malformed_digits_beyond_precision() {
        assert!(matches!(to_minimal_units("1.00x", 2), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn test_overflow_is_surfaced() {
        let huge = "9".repeat(78);
        assert_eq!(to_minimal_units(&huge, 18), Err(AmountError::Overflow));
    }

    #[test]
    fn test_price_probe_detection() {
        assert!(is_price_probe(None));
        assert!(is_price_probe(Some("")));
        assert!(is_price_probe(Some("0")));
        assert!(is_price_probe(Some("0.000")));
        assert!(!is_price_probe(Some("0.1")));
        assert!(!is_price_probe(Some("1.5")));
    }
}
