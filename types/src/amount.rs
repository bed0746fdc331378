//! Validated token amounts: vote weights and session budgets.
//!
//! Both are positive integers counted in whole ledger tokens. User input
//! arrives either as text from a form field or as a number from code, so
//! parsing goes through [`RawAmount`] and always ends in a typed value or an
//! [`AmountError`]. Nothing downstream ever sees an unchecked amount.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AmountError;

/// An amount as the caller supplied it, before validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawAmount<'a> {
    Text(&'a str),
    Number(i128),
}

impl<'a> From<&'a str> for RawAmount<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a String> for RawAmount<'a> {
    fn from(s: &'a String) -> Self {
        Self::Text(s.as_str())
    }
}

macro_rules! raw_amount_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawAmount<'_> {
                fn from(n: $t) -> Self {
                    Self::Number(i128::from(n))
                }
            }
        )*
    };
}

raw_amount_from_int!(i32, i64, u32, u64);

/// Parse a raw amount into a strictly positive integer.
///
/// Text is trimmed and must consist of ASCII digits only (an optional
/// leading `-` is recognised so negative input reports `NotPositive`
/// rather than `NotANumber`).
pub fn parse_positive(raw: RawAmount<'_>) -> Result<u128, AmountError> {
    match raw {
        RawAmount::Number(n) if n <= 0 => Err(AmountError::NotPositive(n.to_string())),
        RawAmount::Number(n) => Ok(n as u128),
        RawAmount::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(AmountError::Empty);
            }
            let (negative, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, trimmed),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(AmountError::NotANumber(trimmed.to_string()));
            }
            if negative {
                return Err(AmountError::NotPositive(trimmed.to_string()));
            }
            let value = digits
                .parse::<u128>()
                .map_err(|_| AmountError::Overflow(trimmed.to_string()))?;
            if value == 0 {
                return Err(AmountError::NotPositive(trimmed.to_string()));
            }
            Ok(value)
        }
    }
}

/// The number of tokens a participant commits to one vote. Always > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u128", into = "u128")]
pub struct Weight(u128);

impl Weight {
    /// Wrap a raw value; `None` for zero.
    pub fn new(value: u128) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Validate user input into a weight.
    pub fn parse<'a>(raw: impl Into<RawAmount<'a>>) -> Result<Self, AmountError> {
        parse_positive(raw.into()).map(Self)
    }

    pub fn get(&self) -> u128 {
        self.0
    }
}

impl TryFrom<u128> for Weight {
    type Error = AmountError;

    fn try_from(value: u128) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| AmountError::NotPositive(value.to_string()))
    }
}

impl From<Weight> for u128 {
    fn from(w: Weight) -> Self {
        w.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The token budget a session is opened with. Fixed for the session's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u128", into = "u128")]
pub struct Budget(u128);

impl Budget {
    /// Wrap a raw value; `None` for zero.
    pub fn new(value: u128) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// Validate user input into a budget.
    pub fn parse<'a>(raw: impl Into<RawAmount<'a>>) -> Result<Self, AmountError> {
        parse_positive(raw.into()).map(Self)
    }

    pub fn get(&self) -> u128 {
        self.0
    }
}

impl TryFrom<u128> for Budget {
    type Error = AmountError;

    fn try_from(value: u128) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| AmountError::NotPositive(value.to_string()))
    }
}

impl From<Budget> for u128 {
    fn from(b: Budget) -> Self {
        b.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} LVT", self.0)
    }
}
