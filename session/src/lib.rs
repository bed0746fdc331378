//! Client-side voting session for lvote.
//!
//! [`VotingClient`] is the one context object an application holds. It
//! provides:
//! - Session lifecycle gating (`Idle`, `Voting`, `Ended`) with the
//!   open/close affordance pair
//! - A registry cache of participants and position-indexed options
//! - Vote submission by option position
//! - Ledger sync after every mutation, with stale responses discarded
//! - A rendered [`View`] for whatever UI sits on top
//!
//! All ledger access goes through an `Arc<dyn LedgerGateway>`.

pub mod client;
pub mod config;
pub mod error;
pub mod registry;
pub mod session;
pub mod sync;
pub mod view;
pub mod vote;

pub use client::{ClientOptions, VotingClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use registry::{OptionSnapshot, ParticipantSnapshot, RegistryCache};
pub use session::{Affordances, Session, SessionStateMachine};
pub use view::{InputFields, View};
pub use vote::VoteForm;
