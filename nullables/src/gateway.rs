//! Nullable ledger gateway: an in-memory ledger that records calls.

use async_trait::async_trait;
use lvote_gateway::{GatewayError, LedgerGateway};
use lvote_types::{Balance, Budget, NativeAmount, Participant, Phase, VoteRequest};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One recorded gateway call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayCall {
    ListParticipantNames,
    ListOptionNames,
    GetBalance(String),
    GetLastWinner,
    RegisterParticipant(Participant),
    AddOption(String),
    OpenSession(Budget),
    CloseSession,
    CastVote(VoteRequest),
    SessionPhase,
}

/// A call's kind, without its payload. Used to script failures and delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    ListParticipantNames,
    ListOptionNames,
    GetBalance,
    GetLastWinner,
    RegisterParticipant,
    AddOption,
    OpenSession,
    CloseSession,
    CastVote,
    SessionPhase,
}

impl GatewayCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::ListParticipantNames => CallKind::ListParticipantNames,
            Self::ListOptionNames => CallKind::ListOptionNames,
            Self::GetBalance(_) => CallKind::GetBalance,
            Self::GetLastWinner => CallKind::GetLastWinner,
            Self::RegisterParticipant(_) => CallKind::RegisterParticipant,
            Self::AddOption(_) => CallKind::AddOption,
            Self::OpenSession(_) => CallKind::OpenSession,
            Self::CloseSession => CallKind::CloseSession,
            Self::CastVote(_) => CallKind::CastVote,
            Self::SessionPhase => CallKind::SessionPhase,
        }
    }

    /// Whether this call changes ledger state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::RegisterParticipant(_)
                | Self::AddOption(_)
                | Self::OpenSession(_)
                | Self::CloseSession
                | Self::CastVote(_)
        )
    }
}

#[derive(Default)]
struct NullLedger {
    participants: Vec<Participant>,
    options: Vec<String>,
    tallies: Vec<u128>,
    balances: HashMap<String, Balance>,
    last_winner: String,
    voting: bool,
    ended: bool,
}

/// In-memory ledger gateway for tests.
///
/// Opening a session credits every registered participant with the budget;
/// a vote moves weight from the caller's balance onto the option's tally;
/// closing picks the highest tally (earliest option on ties) as winner.
pub struct NullGateway {
    ledger: Mutex<NullLedger>,
    caller: String,
    reports_phase: bool,
    calls: Mutex<Vec<GatewayCall>>,
    failures: Mutex<HashMap<CallKind, VecDeque<GatewayError>>>,
    delays: Mutex<HashMap<CallKind, VecDeque<Duration>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NullGateway {
    /// A gateway whose votes are cast by `caller`.
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            ledger: Mutex::new(NullLedger::default()),
            caller: caller.into(),
            reports_phase: false,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
        }
    }

    /// Answer `session_phase` like a backend that exposes its phase.
    pub fn reporting_phase(mut self) -> Self {
        self.reports_phase = true;
        self
    }

    /// Seed participants without recording calls.
    pub fn with_participants(self, participants: &[(&str, &str)]) -> Self {
        {
            let mut ledger = lock(&self.ledger);
            for (address, name) in participants {
                ledger.participants.push(Participant::new(*address, *name));
            }
        }
        self
    }

    /// Seed options without recording calls.
    pub fn with_options(self, names: &[&str]) -> Self {
        {
            let mut ledger = lock(&self.ledger);
            for name in names {
                ledger.options.push(name.to_string());
                ledger.tallies.push(0);
            }
        }
        self
    }

    /// Seed a balance without recording calls.
    pub fn with_balance(self, address: &str, tokens: u128) -> Self {
        lock(&self.ledger)
            .balances
            .insert(address.to_string(), Balance::new(tokens, NativeAmount::ZERO));
        self
    }

    /// Seed a winner from an earlier session.
    pub fn with_last_winner(self, name: &str) -> Self {
        {
            let mut ledger = lock(&self.ledger);
            ledger.last_winner = name.to_string();
            ledger.ended = true;
        }
        self
    }

    /// Put the ledger into an open session, as if another client opened it.
    pub fn set_voting(&self, voting: bool) {
        let mut ledger = lock(&self.ledger);
        ledger.voting = voting;
        if !voting {
            ledger.ended = true;
        }
    }

    /// Add an option behind the client's back.
    pub fn push_option(&self, name: &str) {
        let mut ledger = lock(&self.ledger);
        ledger.options.push(name.to_string());
        ledger.tallies.push(0);
    }

    /// Make the next call of `kind` fail with `error`.
    pub fn fail_next(&self, kind: CallKind, error: GatewayError) {
        lock(&self.failures).entry(kind).or_default().push_back(error);
    }

    /// Make the next call of `kind` answer only after `delay`.
    ///
    /// The answer reflects the ledger at call time, so a delayed read models
    /// a response that was already stale when it arrived.
    pub fn delay_next(&self, kind: CallKind, delay: Duration) {
        lock(&self.delays).entry(kind).or_default().push_back(delay);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        lock(&self.calls).iter().filter(|c| c.kind() == kind).count()
    }

    /// Number of recorded state-changing calls.
    pub fn mutation_count(&self) -> usize {
        lock(&self.calls).iter().filter(|c| c.is_mutation()).count()
    }

    /// Current tally per option, in position order.
    pub fn tallies(&self) -> Vec<u128> {
        lock(&self.ledger).tallies.clone()
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: GatewayCall) -> Result<Option<Duration>, GatewayError> {
        let kind = call.kind();
        lock(&self.calls).push(call);
        if let Some(err) = lock(&self.failures).get_mut(&kind).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        Ok(lock(&self.delays).get_mut(&kind).and_then(VecDeque::pop_front))
    }

    async fn answer<T>(&self, delay: Option<Duration>, value: T) -> T {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        value
    }
}

fn rejected(reason: &str) -> GatewayError {
    GatewayError::Rejected(reason.to_string())
}

#[async_trait]
impl LedgerGateway for NullGateway {
    fn backend(&self) -> &'static str {
        "null"
    }

    async fn list_participant_names(&self) -> Result<Vec<String>, GatewayError> {
        let delay = self.record(GatewayCall::ListParticipantNames)?;
        let names = lock(&self.ledger)
            .participants
            .iter()
            .map(|p| p.name.clone())
            .collect();
        Ok(self.answer(delay, names).await)
    }

    async fn list_option_names(&self) -> Result<Vec<String>, GatewayError> {
        let delay = self.record(GatewayCall::ListOptionNames)?;
        let names = lock(&self.ledger).options.clone();
        Ok(self.answer(delay, names).await)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, GatewayError> {
        let delay = self.record(GatewayCall::GetBalance(address.to_string()))?;
        let balance = lock(&self.ledger)
            .balances
            .get(address)
            .copied()
            .unwrap_or_default();
        Ok(self.answer(delay, balance).await)
    }

    async fn get_last_winner(&self) -> Result<String, GatewayError> {
        let delay = self.record(GatewayCall::GetLastWinner)?;
        let winner = lock(&self.ledger).last_winner.clone();
        Ok(self.answer(delay, winner).await)
    }

    async fn register_participant(&self, participant: &Participant) -> Result<(), GatewayError> {
        let delay = self.record(GatewayCall::RegisterParticipant(participant.clone()))?;
        let result = {
            let mut ledger = lock(&self.ledger);
            if ledger
                .participants
                .iter()
                .any(|p| p.address == participant.address)
            {
                Err(rejected("participant already registered"))
            } else {
                ledger.participants.push(participant.clone());
                Ok(())
            }
        };
        self.answer(delay, result).await
    }

    async fn add_option(&self, name: &str) -> Result<(), GatewayError> {
        let delay = self.record(GatewayCall::AddOption(name.to_string()))?;
        {
            let mut ledger = lock(&self.ledger);
            ledger.options.push(name.to_string());
            ledger.tallies.push(0);
        }
        self.answer(delay, Ok(())).await
    }

    async fn open_session(&self, budget: Budget) -> Result<(), GatewayError> {
        let delay = self.record(GatewayCall::OpenSession(budget))?;
        let result = {
            let mut ledger = lock(&self.ledger);
            if ledger.voting {
                Err(rejected("voting already in progress"))
            } else {
                ledger.voting = true;
                ledger.tallies.iter_mut().for_each(|t| *t = 0);
                let addresses: Vec<String> =
                    ledger.participants.iter().map(|p| p.address.clone()).collect();
                for address in addresses {
                    ledger.balances.entry(address).or_default().token_balance = budget.get();
                }
                Ok(())
            }
        };
        self.answer(delay, result).await
    }

    async fn close_session(&self) -> Result<(), GatewayError> {
        let delay = self.record(GatewayCall::CloseSession)?;
        let result = {
            let mut ledger = lock(&self.ledger);
            if !ledger.voting {
                Err(rejected("no voting in progress"))
            } else {
                ledger.voting = false;
                ledger.ended = true;
                let mut best: Option<(usize, u128)> = None;
                for (i, tally) in ledger.tallies.iter().enumerate() {
                    if *tally > 0 && best.map_or(true, |(_, b)| *tally > b) {
                        best = Some((i, *tally));
                    }
                }
                let winner = best
                    .map(|(i, _)| ledger.options[i].clone())
                    .unwrap_or_default();
                ledger.last_winner = winner;
                Ok(())
            }
        };
        self.answer(delay, result).await
    }

    async fn cast_vote(&self, vote: VoteRequest) -> Result<(), GatewayError> {
        let delay = self.record(GatewayCall::CastVote(vote))?;
        let result = {
            let mut ledger = lock(&self.ledger);
            let available = ledger
                .balances
                .get(&self.caller)
                .map(|b| b.token_balance)
                .unwrap_or(0);
            if !ledger.voting {
                Err(rejected("voting is not open"))
            } else if vote.position >= ledger.options.len() {
                Err(rejected("no such option"))
            } else if vote.weight.get() > available {
                Err(rejected("insufficient token balance"))
            } else {
                ledger.tallies[vote.position] += vote.weight.get();
                let caller = self.caller.clone();
                ledger.balances.entry(caller).or_default().token_balance -= vote.weight.get();
                Ok(())
            }
        };
        self.answer(delay, result).await
    }

    async fn session_phase(&self) -> Result<Option<Phase>, GatewayError> {
        let delay = self.record(GatewayCall::SessionPhase)?;
        let phase = if !self.reports_phase {
            None
        } else {
            let ledger = lock(&self.ledger);
            Some(if ledger.voting {
                Phase::Voting
            } else if ledger.ended {
                Phase::Ended
            } else {
                Phase::Idle
            })
        };
        Ok(self.answer(delay, phase).await)
    }
}
