//! Sync coordinator: pull the ledger's view back into the client.
//!
//! A full refresh reads participants, the account balance, and (once a
//! session exists, or always when configured) the options. The reads run
//! concurrently and nothing is applied until all of them have answered; if
//! any one fails the view keeps what it had.

use lvote_types::Phase;

use crate::client::VotingClient;
use crate::error::ClientError;
use crate::view::render_winner;

impl VotingClient {
    /// Re-read everything the view shows.
    pub async fn refresh_all(&self) -> Result<(), ClientError> {
        let ticket = self.next_ticket();
        let (phase, epoch) = {
            let state = self.state();
            (state.machine.phase(), state.machine.epoch())
        };
        let show_options = self.shows_options(phase);
        let gateway = self.gateway();

        let options = async {
            if show_options {
                gateway.list_option_names().await.map(Some)
            } else {
                Ok(None)
            }
        };
        let (participants, balance, options) = tokio::join!(
            gateway.list_participant_names(),
            gateway.get_balance(self.account()),
            options,
        );

        for (what, failure) in [
            ("participants", participants.as_ref().err()),
            ("balance", balance.as_ref().err()),
            ("options", options.as_ref().err()),
        ] {
            if let Some(err) = failure {
                tracing::warn!(what, ticket, error = %err, "refresh failed, view left unchanged");
            }
        }
        let participants = participants?;
        let balance = balance?;
        let options = options?;

        let mut state = self.state();
        if !state.registry.replace_participants(participants, ticket) {
            tracing::debug!(ticket, "discarding stale participant list");
        }
        if let Some(names) = options {
            if !state.registry.replace_options(names, ticket) {
                tracing::debug!(ticket, "discarding stale option list");
            }
        }
        if state.machine.epoch() != epoch {
            tracing::debug!(ticket, "phase changed during refresh, dropping balance");
        } else if ticket < state.balance_ticket {
            tracing::debug!(ticket, "discarding stale balance");
        } else {
            state.balance = Some(balance);
            state.balance_ticket = ticket;
        }
        tracing::debug!(ticket, %phase, show_options, "refresh applied");
        Ok(())
    }

    /// Fetch and record the winner of the session that just ended.
    pub async fn refresh_last_winner(&self) -> Result<String, ClientError> {
        let phase = self.current_phase();
        if phase != Phase::Ended {
            return Err(ClientError::InvalidTransition {
                operation: "fetch the last winner",
                phase,
            });
        }

        let winner = self
            .gateway()
            .get_last_winner()
            .await
            .map_err(|e| self.log_refresh_failure("last winner", e))?;
        let text = render_winner(&winner);

        let mut state = self.state();
        match state.machine.record_winner(winner.trim()) {
            Ok(()) => state.winner_text = Some(text.clone()),
            Err(e) => tracing::debug!(error = %e, "session moved on before the winner arrived"),
        }
        Ok(text)
    }

    /// Fetch and render the ledger's last winner without touching state.
    pub async fn read_last_winner(&self) -> Result<String, ClientError> {
        let winner = self
            .gateway()
            .get_last_winner()
            .await
            .map_err(|e| self.log_refresh_failure("last winner", e))?;
        Ok(render_winner(&winner))
    }

    /// Adopt the phase the ledger reports, if it reports one.
    ///
    /// Returns whether local state changed.
    pub async fn reconcile_phase(&self) -> bool {
        let reported = match self.gateway().session_phase().await {
            Ok(Some(phase)) => phase,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "could not read session phase from ledger");
                return false;
            }
        };
        let mut state = self.state();
        let changed = state.machine.reconcile(reported);
        if changed {
            state.forget_balance();
        }
        changed
    }

    /// Initial load: adopt the ledger's phase, then refresh everything.
    pub async fn load(&self) -> Result<(), ClientError> {
        self.reconcile_phase().await;
        if self.current_phase() == Phase::Ended {
            if let Err(e) = self.refresh_last_winner().await {
                tracing::debug!(error = %e, "no winner shown on load");
            }
        }
        self.refresh_all().await
    }
}
