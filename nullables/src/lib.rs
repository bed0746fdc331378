//! Nullable infrastructure for deterministic testing.
//!
//! The ledger is the only external dependency of the session core, and it is
//! abstracted behind [`lvote_gateway::LedgerGateway`]. This crate provides a
//! test-friendly implementation that:
//! - Keeps the whole ledger in memory
//! - Records every call for assertions
//! - Can be scripted to fail or to answer late
//! - Never touches the network
//!
//! Usage: swap the real gateway for [`NullGateway`] in tests.

pub mod gateway;

pub use gateway::{CallKind, GatewayCall, NullGateway};
