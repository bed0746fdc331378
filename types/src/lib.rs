//! Fundamental types for lvote.
//!
//! This crate defines the values shared by every other crate in the workspace:
//! participants, voting options, the session phase, balances, and the
//! validated token amounts (weights and budgets) that cross the gateway.

pub mod amount;
pub mod balance;
pub mod error;
pub mod option;
pub mod participant;
pub mod phase;
pub mod vote;

pub use amount::{Budget, RawAmount, Weight};
pub use balance::{parse_token_count, Balance, NativeAmount};
pub use error::AmountError;
pub use option::VoteOption;
pub use participant::Participant;
pub use phase::Phase;
pub use vote::VoteRequest;
