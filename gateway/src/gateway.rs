//! The backend-agnostic ledger interface.

use async_trait::async_trait;
use lvote_types::{Balance, Budget, Participant, Phase, VoteRequest};

use crate::error::GatewayError;

/// Authoritative store for registries, balances and tallies.
///
/// Every method is one round trip; none retries. Timeouts are each
/// implementation's responsibility.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Short backend name for logs (`"rest"`, `"contract"`, ...).
    fn backend(&self) -> &'static str;

    /// All participant names, in registration order.
    async fn list_participant_names(&self) -> Result<Vec<String>, GatewayError>;

    /// All option names; the index of each name is its position.
    async fn list_option_names(&self) -> Result<Vec<String>, GatewayError>;

    async fn get_balance(&self, address: &str) -> Result<Balance, GatewayError>;

    /// Name of the last winning option, or an empty string if none.
    async fn get_last_winner(&self) -> Result<String, GatewayError>;

    async fn register_participant(&self, participant: &Participant) -> Result<(), GatewayError>;

    async fn add_option(&self, name: &str) -> Result<(), GatewayError>;

    async fn open_session(&self, budget: Budget) -> Result<(), GatewayError>;

    async fn close_session(&self) -> Result<(), GatewayError>;

    async fn cast_vote(&self, vote: VoteRequest) -> Result<(), GatewayError>;

    /// The session phase as the backend sees it, when the backend can say.
    ///
    /// `Ok(None)` means the backend does not expose its phase.
    async fn session_phase(&self) -> Result<Option<Phase>, GatewayError> {
        Ok(None)
    }
}
