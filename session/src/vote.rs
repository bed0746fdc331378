//! Vote orchestrator: validate one vote and submit it by option position.

use lvote_types::{RawAmount, VoteOption, VoteRequest, Weight};

use crate::client::{ClientState, VotingClient};
use crate::error::ClientError;

/// A vote control built for one option when the option list was rendered.
///
/// The position is captured at render time, so submitting through a form
/// never re-derives the target from displayed text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteForm {
    position: usize,
    option_name: String,
    generation: u64,
}

impl VoteForm {
    pub(crate) fn new(option: &VoteOption, generation: u64) -> Self {
        Self {
            position: option.position,
            option_name: option.name.clone(),
            generation,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn option_name(&self) -> &str {
        &self.option_name
    }

    /// Refresh ticket of the option snapshot this form was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Phase gate and weight checks shared by both vote paths.
fn admit_weight(state: &mut ClientState, raw: RawAmount<'_>) -> Result<Weight, ClientError> {
    let phase = state.machine.phase();
    if !phase.accepts_votes() {
        return Err(state.raise(ClientError::InvalidTransition {
            operation: "cast a vote",
            phase,
        }));
    }
    if state.machine.is_pending() {
        return Err(state.raise(ClientError::TransitionPending {
            operation: "cast a vote",
        }));
    }

    let weight = Weight::parse(raw).map_err(|e| state.raise(ClientError::invalid_amount("weight", e)))?;

    if let Some(balance) = state.balance {
        if weight.get() > balance.token_balance {
            return Err(state.raise(ClientError::Validation(format!(
                "weight {weight} exceeds token balance {}",
                balance.token_balance
            ))));
        }
    }
    Ok(weight)
}

impl VotingClient {
    /// Cast `weight` tokens for the option named `option_name`.
    ///
    /// The name is resolved against the option snapshot currently displayed
    /// (first exact match). An unknown name is a defect in the caller, not a
    /// retryable condition.
    pub async fn cast_vote<'a>(
        &self,
        option_name: &str,
        weight: impl Into<RawAmount<'a>>,
    ) -> Result<(), ClientError> {
        let request = {
            let mut state = self.state();
            let weight = admit_weight(&mut state, weight.into())?;
            let Some(position) = state.registry.options().resolve(option_name) else {
                tracing::error!(
                    option = option_name,
                    generation = state.registry.options().generation(),
                    "vote names an option missing from the displayed snapshot"
                );
                return Err(ClientError::OptionNotFound(option_name.to_string()));
            };
            VoteRequest { position, weight }
        };
        self.submit_vote(request).await
    }

    /// Cast `weight` tokens through a form bound at render time.
    pub async fn cast_vote_with_form<'a>(
        &self,
        form: &VoteForm,
        weight: impl Into<RawAmount<'a>>,
    ) -> Result<(), ClientError> {
        let request = {
            let mut state = self.state();
            let weight = admit_weight(&mut state, weight.into())?;
            let options = state.registry.options();
            if options.get(form.position).is_none() {
                tracing::error!(
                    position = form.position,
                    option = %form.option_name,
                    "vote form points past the current option list"
                );
                return Err(ClientError::OptionNotFound(form.option_name.clone()));
            }
            if form.generation != options.generation() {
                // positions are append-only, so an older form still addresses the same option
                tracing::debug!(
                    form_generation = form.generation,
                    current = options.generation(),
                    "vote form built from an earlier option snapshot"
                );
            }
            VoteRequest {
                position: form.position,
                weight,
            }
        };
        self.submit_vote(request).await
    }

    async fn submit_vote(&self, request: VoteRequest) -> Result<(), ClientError> {
        if let Err(e) = self.gateway().cast_vote(request).await {
            return Err(self.recover("cast vote", e).await);
        }
        tracing::info!(position = request.position, weight = %request.weight, "vote accepted");

        self.state().inputs.weight.clear();
        self.refresh_all().await
    }
}
