//! Participant balances as reported by the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AmountError;

/// Decimal places of the native coin (wei-style base units).
pub const NATIVE_DECIMALS: u32 = 18;

const NATIVE_SCALE: u128 = 10u128.pow(NATIVE_DECIMALS);

/// Native coin amount, stored in base units to avoid floating point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeAmount(u128);

impl NativeAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_base_units(raw: u128) -> Self {
        Self(raw)
    }

    pub fn base_units(&self) -> u128 {
        self.0
    }

    /// Parse a non-negative decimal string such as `"1.25"`, `"3"` or
    /// `"1.5e-7"`.
    pub fn parse_decimal(input: &str) -> Result<Self, AmountError> {
        parse_scaled(input, NATIVE_DECIMALS).map(Self)
    }

    /// Parse a JSON-RPC hex quantity (`"0x1bc16d674ec80000"`).
    pub fn parse_hex_quantity(input: &str) -> Result<Self, AmountError> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.is_empty() {
            return Ok(Self::ZERO);
        }
        u128::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| AmountError::InvalidDecimal {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Parse a whole token count. JSON encoders may send `1000.0` or `1e3`.
pub fn parse_token_count(input: &str) -> Result<u128, AmountError> {
    parse_scaled(input, 0)
}

const MAX_EXPONENT: i64 = 64;

/// Parse a plain or scientific decimal into integer units of
/// `10^-decimals`. Digits below that precision must be zero.
fn parse_scaled(input: &str, decimals: u32) -> Result<u128, AmountError> {
    let invalid = |reason: &str| AmountError::InvalidDecimal {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    let (mantissa, exponent) = match s.split_once(['e', 'E']) {
        Some((m, e)) => {
            let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("malformed exponent"));
            }
            let exp = e.parse::<i64>().map_err(|_| invalid("exponent out of range"))?;
            if exp.abs() > MAX_EXPONENT {
                return Err(invalid("exponent out of range"));
            }
            (m, exp)
        }
        None => (s, 0),
    };
    let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected digits with an optional decimal point"));
    }

    let digits = format!("{whole}{frac}");
    let shift = i64::from(decimals) - frac.len() as i64 + exponent;
    let kept = if shift >= 0 {
        digits.as_str()
    } else {
        let cut = digits.len().saturating_sub(shift.unsigned_abs() as usize);
        let (kept, dropped) = digits.split_at(cut);
        if dropped.bytes().any(|b| b != b'0') {
            return Err(invalid(&match decimals {
                0 => "not a whole number".to_string(),
                n => format!("more than {n} fractional digits"),
            }));
        }
        kept
    };

    let significant = kept.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(0);
    }
    let overflow = || AmountError::Overflow(s.to_string());
    let value = significant.parse::<u128>().map_err(|_| overflow())?;
    if shift <= 0 {
        return Ok(value);
    }
    10u128
        .checked_pow(shift as u32)
        .and_then(|scale| value.checked_mul(scale))
        .ok_or_else(overflow)
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / NATIVE_SCALE;
        let frac = self.0 % NATIVE_SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:0>width$}", width = NATIVE_DECIMALS as usize);
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

/// Balance projection for one participant.
///
/// Always fetched fresh from the ledger; it changes as a side effect of voting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Voting tokens held.
    pub token_balance: u128,
    /// Native coin held (pays for transactions on contract backends).
    pub native_balance: NativeAmount,
}

impl Balance {
    pub fn new(token_balance: u128, native_balance: NativeAmount) -> Self {
        Self {
            token_balance,
            native_balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_parse_and_display() {
        let a = NativeAmount::parse_decimal("1.25").unwrap();
        assert_eq!(a.base_units(), 1_250_000_000_000_000_000);
        assert_eq!(a.to_string(), "1.25");

        let b = NativeAmount::parse_decimal("3").unwrap();
        assert_eq!(b.to_string(), "3");

        let c = NativeAmount::parse_decimal(".5").unwrap();
        assert_eq!(c.to_string(), "0.5");
    }

    #[test]
    fn decimal_rejects_garbage() {
        assert!(NativeAmount::parse_decimal("").is_err());
        assert!(NativeAmount::parse_decimal(".").is_err());
        assert!(NativeAmount::parse_decimal("-1").is_err());
        assert!(NativeAmount::parse_decimal("1.2.3").is_err());
        assert!(NativeAmount::parse_decimal("0.0000000000000000001").is_err());
    }

    #[test]
    fn decimal_accepts_exponent_form() {
        let a = NativeAmount::parse_decimal("1e-7").unwrap();
        assert_eq!(a.base_units(), 100_000_000_000);
        assert_eq!(a.to_string(), "0.0000001");

        let b = NativeAmount::parse_decimal("1.5e-7").unwrap();
        assert_eq!(b.to_string(), "0.00000015");

        assert_eq!(NativeAmount::parse_decimal("2.5E+1").unwrap().to_string(), "25");
        assert_eq!(NativeAmount::parse_decimal("0e-40").unwrap(), NativeAmount::ZERO);
        assert!(NativeAmount::parse_decimal("1e-19").is_err());
        assert!(NativeAmount::parse_decimal("1e").is_err());
        assert!(NativeAmount::parse_decimal("1e+-3").is_err());
        assert!(matches!(
            NativeAmount::parse_decimal("1e30"),
            Err(AmountError::Overflow(_))
        ));
    }

    #[test]
    fn token_counts_are_whole() {
        assert_eq!(parse_token_count("1000").unwrap(), 1000);
        assert_eq!(parse_token_count("1e3").unwrap(), 1000);
        assert_eq!(parse_token_count("1000.0").unwrap(), 1000);
        assert_eq!(parse_token_count("1.25e2").unwrap(), 125);
        assert!(parse_token_count("1.5").is_err());
        assert!(parse_token_count("-1").is_err());
    }

    #[test]
    fn hex_quantity() {
        let a = NativeAmount::parse_hex_quantity("0xde0b6b3a7640000").unwrap();
        assert_eq!(a.to_string(), "1");
        assert_eq!(NativeAmount::parse_hex_quantity("0x").unwrap(), NativeAmount::ZERO);
        assert!(NativeAmount::parse_hex_quantity("0xzz").is_err());
    }
}
