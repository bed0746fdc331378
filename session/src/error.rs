use lvote_gateway::GatewayError;
use lvote_types::{AmountError, Phase};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Empty or malformed user input. Never reaches the gateway.
    #[error("{0}")]
    Validation(String),

    /// Operation attempted in the wrong session phase. Never reaches the gateway.
    #[error("cannot {operation} while the session is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },

    /// Another open/close is still waiting on the ledger.
    #[error("cannot {operation}: a session phase change is still pending")]
    TransitionPending { operation: &'static str },

    /// The ledger call failed or was reverted.
    #[error("ledger gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A vote referenced an option the displayed snapshot does not hold.
    #[error("option {0:?} is not in the current option list")]
    OptionNotFound(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    /// Errors resolved locally that the user must be told about.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidTransition { .. } | Self::TransitionPending { .. }
        )
    }

    pub(crate) fn invalid_amount(what: &str, err: AmountError) -> Self {
        Self::Validation(format!("invalid {what}: {err}"))
    }
}
