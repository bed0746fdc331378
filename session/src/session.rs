//! Session state machine: phase, budget, and the open/close affordance pair.
//!
//! ```text
//! Idle ──open──▶ Voting ──close──▶ Ended ──open──▶ Voting ...
//! ```
//!
//! A transition happens in two steps. `begin_*` checks the phase and flips
//! the affordances while the ledger call is in flight; `confirm_*` commits
//! the new phase once the ledger accepts, and `rollback` restores the prior
//! pairing if it does not. The affordances therefore only ever show the
//! last state the ledger confirmed, plus the one change being attempted.

use lvote_types::{Budget, Phase, RawAmount};

use crate::client::VotingClient;
use crate::error::ClientError;

/// The single active session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    /// Fixed when the session is opened; `None` before the first open or
    /// when the phase was adopted from the ledger without a budget.
    pub budget: Option<Budget>,
    /// Set only when a session ends.
    pub last_winner: Option<String>,
}

/// Enabled/disabled state of the "open" and "close" controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Affordances {
    pub open_enabled: bool,
    pub close_enabled: bool,
}

impl Affordances {
    /// The pairing that matches a confirmed phase. Always mutually exclusive.
    pub fn for_phase(phase: Phase) -> Self {
        let voting = phase == Phase::Voting;
        Self {
            open_enabled: !voting,
            close_enabled: voting,
        }
    }
}

/// Token returned by `begin_*`; hand it back to `confirm_*` or `rollback`.
#[derive(Debug)]
#[must_use]
pub struct PendingTransition {
    prior: Affordances,
}

#[derive(Debug)]
pub struct SessionStateMachine {
    session: Session,
    affordances: Affordances,
    pending: bool,
    epoch: u64,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            session: Session::default(),
            affordances: Affordances::for_phase(Phase::Idle),
            pending: false,
            epoch: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn affordances(&self) -> Affordances {
        self.affordances
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Incremented on every phase change. Data fetched under an older epoch
    /// (balances in particular) must not be applied.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn guard(&self, operation: &'static str, allowed: bool) -> Result<(), ClientError> {
        if self.pending {
            return Err(ClientError::TransitionPending { operation });
        }
        if !allowed {
            return Err(ClientError::InvalidTransition {
                operation,
                phase: self.session.phase,
            });
        }
        Ok(())
    }

    pub fn begin_open(&mut self) -> Result<PendingTransition, ClientError> {
        self.guard("open a session", self.session.phase.can_open())?;
        Ok(self.begin(Affordances::for_phase(Phase::Voting)))
    }

    pub fn begin_close(&mut self) -> Result<PendingTransition, ClientError> {
        self.guard("close the session", self.session.phase.can_close())?;
        Ok(self.begin(Affordances::for_phase(Phase::Ended)))
    }

    fn begin(&mut self, next: Affordances) -> PendingTransition {
        let prior = self.affordances;
        self.affordances = next;
        self.pending = true;
        PendingTransition { prior }
    }

    /// The ledger opened the session: start a fresh one with `budget`.
    pub fn confirm_open(&mut self, _transition: PendingTransition, budget: Budget) {
        self.session = Session {
            phase: Phase::Voting,
            budget: Some(budget),
            last_winner: None,
        };
        self.settle();
    }

    /// The ledger closed the session.
    pub fn confirm_close(&mut self, _transition: PendingTransition) {
        self.session.phase = Phase::Ended;
        self.settle();
    }

    /// The ledger refused: put the affordances back as they were.
    pub fn rollback(&mut self, transition: PendingTransition) {
        self.affordances = transition.prior;
        self.pending = false;
    }

    fn settle(&mut self) {
        self.affordances = Affordances::for_phase(self.session.phase);
        self.pending = false;
        self.epoch += 1;
    }

    /// Adopt the phase the ledger reports. Returns whether anything changed.
    ///
    /// Ignored while a transition is pending; its outcome will settle state.
    pub fn reconcile(&mut self, reported: Phase) -> bool {
        if self.pending {
            return false;
        }
        // a ledger that records no winner cannot tell an ended session
        // from one never opened
        if self.session.phase == Phase::Ended && reported == Phase::Idle {
            return false;
        }
        let affordances = Affordances::for_phase(reported);
        if reported == self.session.phase && affordances == self.affordances {
            return false;
        }
        if reported != self.session.phase {
            tracing::info!(local = %self.session.phase, ledger = %reported, "adopting ledger session phase");
            if reported == Phase::Voting {
                // a session we did not open: budget unknown
                self.session = Session {
                    phase: Phase::Voting,
                    budget: None,
                    last_winner: None,
                };
            } else {
                self.session.phase = reported;
            }
            self.epoch += 1;
        }
        self.affordances = affordances;
        true
    }

    /// Record the winner of the session that just ended.
    pub fn record_winner(&mut self, winner: &str) -> Result<(), ClientError> {
        if self.session.phase != Phase::Ended {
            return Err(ClientError::InvalidTransition {
                operation: "record a winner",
                phase: self.session.phase,
            });
        }
        self.session.last_winner = (!winner.is_empty()).then(|| winner.to_string());
        Ok(())
    }
}

impl VotingClient {
    pub fn current_phase(&self) -> Phase {
        self.state().machine.phase()
    }

    /// Open a voting session that credits every participant with `budget`.
    pub async fn open_session<'a>(&self, budget: impl Into<RawAmount<'a>>) -> Result<(), ClientError> {
        let raw = budget.into();
        let (transition, budget) = {
            let mut state = self.state();
            let transition = match state.machine.begin_open() {
                Ok(t) => t,
                Err(e) => return Err(state.raise(e)),
            };
            match Budget::parse(raw) {
                Ok(budget) => (transition, budget),
                Err(e) => {
                    state.machine.rollback(transition);
                    return Err(state.raise(ClientError::invalid_amount("budget", e)));
                }
            }
        };

        if let Err(e) = self.gateway().open_session(budget).await {
            self.state().machine.rollback(transition);
            return Err(self.recover("open session", e).await);
        }
        {
            let mut state = self.state();
            state.machine.confirm_open(transition, budget);
            state.forget_balance();
        }
        tracing::info!(%budget, "voting session opened");

        self.refresh_all().await
    }

    /// Close the running session and fetch its winner.
    pub async fn close_session(&self) -> Result<(), ClientError> {
        let transition = {
            let mut state = self.state();
            match state.machine.begin_close() {
                Ok(t) => t,
                Err(e) => return Err(state.raise(e)),
            }
        };

        if let Err(e) = self.gateway().close_session().await {
            self.state().machine.rollback(transition);
            return Err(self.recover("close session", e).await);
        }
        {
            let mut state = self.state();
            state.machine.confirm_close(transition);
            state.forget_balance();
        }
        tracing::info!("voting session closed");

        let winner = self.refresh_last_winner().await;
        let refreshed = self.refresh_all().await;
        winner?;
        refreshed
    }
}
