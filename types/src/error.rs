//! Parse errors for user-supplied amounts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount is not a whole number: {0:?}")]
    NotANumber(String),

    #[error("amount must be positive, got {0}")]
    NotPositive(String),

    #[error("amount is too large: {0}")]
    Overflow(String),

    #[error("invalid decimal amount {input:?}: {reason}")]
    InvalidDecimal { input: String, reason: String },
}
