//! The session context: one object that owns everything the client knows.
//!
//! [`VotingClient`] is created when the application starts and lives until
//! it exits. Operations are split by concern across the crate
//! (`session`, `registry`, `vote`, `sync`) as `impl VotingClient` blocks.
//!
//! All state sits behind one `std::sync::Mutex` that is only ever held
//! between suspension points, never across a ledger call. Handlers may
//! interleave while a call is in flight; refresh tickets decide which
//! response wins.

use lvote_gateway::{GatewayError, LedgerGateway};
use lvote_types::{Balance, Phase};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::registry::RegistryCache;
use crate::session::SessionStateMachine;
use crate::view::{render_balance, InputFields, View};

/// Behaviour switches for a client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Fetch and show options even before a session has been opened.
    pub always_show_options: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ClientState {
    pub machine: SessionStateMachine,
    pub registry: RegistryCache,
    /// Fetched under the current phase epoch; cleared on every transition.
    pub balance: Option<Balance>,
    pub balance_ticket: u64,
    pub winner_text: Option<String>,
    pub inputs: InputFields,
    pub alert: Option<String>,
}

impl ClientState {
    /// Surface a locally resolved error to the user and hand it back.
    pub fn raise(&mut self, err: ClientError) -> ClientError {
        if err.is_user_facing() {
            tracing::debug!(error = %err, "operation refused locally");
            self.alert = Some(err.to_string());
        }
        err
    }

    /// Balances change as a side effect of voting; never carry one over.
    pub fn forget_balance(&mut self) {
        self.balance = None;
    }
}

pub struct VotingClient {
    gateway: Arc<dyn LedgerGateway>,
    account: String,
    options: ClientOptions,
    state: Mutex<ClientState>,
    tickets: AtomicU64,
}

impl VotingClient {
    /// A client for `account` backed by `gateway`.
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        account: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        Self {
            gateway,
            account: account.into(),
            options,
            state: Mutex::new(ClientState::default()),
            tickets: AtomicU64::new(0),
        }
    }

    /// Build the configured gateway and a client on top of it.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        if config.account.trim().is_empty() {
            return Err(ClientError::Config("account must be set".into()));
        }
        let gateway = lvote_gateway::connect(&config.gateway_config())?;
        Ok(Self::new(
            gateway,
            config.account.trim(),
            ClientOptions {
                always_show_options: config.always_show_options,
            },
        ))
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    pub(crate) fn gateway(&self) -> &dyn LedgerGateway {
        self.gateway.as_ref()
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Whether options belong on screen in `phase`.
    pub(crate) fn shows_options(&self, phase: Phase) -> bool {
        self.options.always_show_options || phase != Phase::Idle
    }

    /// Let the UI edit its form fields.
    pub fn edit_inputs(&self, edit: impl FnOnce(&mut InputFields)) {
        edit(&mut self.state().inputs);
    }

    pub fn dismiss_alert(&self) -> Option<String> {
        self.state().alert.take()
    }

    /// Render the current state.
    pub fn view(&self) -> View {
        let state = self.state();
        let phase = state.machine.phase();
        let affordances = state.machine.affordances();
        let show_options = self.shows_options(phase);
        View {
            phase,
            budget: state.machine.session().budget,
            open_enabled: affordances.open_enabled,
            close_enabled: affordances.close_enabled,
            participants: state.registry.participants().render(),
            options: show_options.then(|| state.registry.options().render()),
            vote_forms: if show_options {
                state.registry.options().vote_forms()
            } else {
                Vec::new()
            },
            balance: state.balance.as_ref().map(render_balance),
            last_winner: state.winner_text.clone(),
            alert: state.alert.clone(),
            inputs: state.inputs.clone(),
        }
    }

    pub(crate) fn log_refresh_failure(&self, what: &'static str, err: GatewayError) -> ClientError {
        tracing::warn!(what, backend = self.gateway.backend(), error = %err, "refresh failed");
        ClientError::Gateway(err)
    }

    /// A mutating ledger call failed: log it, re-sync with the ledger, and
    /// return the original failure.
    pub(crate) async fn recover(&self, operation: &'static str, err: GatewayError) -> ClientError {
        tracing::warn!(
            operation,
            backend = self.gateway.backend(),
            error = %err,
            "ledger rejected operation"
        );
        self.reconcile_phase().await;
        if let Err(refresh_err) = self.refresh_all().await {
            tracing::warn!(operation, error = %refresh_err, "re-sync after failure also failed");
        }
        ClientError::Gateway(err)
    }
}
