//! Ledger gateway for lvote.
//!
//! The ledger (a REST service or a voting smart contract) is the source of
//! truth for registries, balances and tallies. This crate hides which one is
//! in use behind [`LedgerGateway`]:
//! - [`RestGateway`]: HTTP/JSON endpoints.
//! - [`ContractGateway`]: Ethereum-style JSON-RPC, calldata encoded from the
//!   [`IVoting`] interface.
//!
//! [`connect`] picks the implementation from a [`GatewayConfig`], so callers
//! never branch on backend type.

pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod rest;

pub use config::{connect, GatewayConfig, GatewayKind};
pub use contract::{ContractAbi, ContractGateway, IVoting};
pub use error::GatewayError;
pub use gateway::LedgerGateway;
pub use rest::RestGateway;
