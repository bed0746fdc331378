//! Registry cache: the local projection of participants and options.
//!
//! Every refresh replaces a whole snapshot; nothing is ever merged. Each
//! snapshot remembers the refresh ticket that produced it, and a snapshot
//! from an older ticket is never applied over a newer one.

use lvote_types::{Participant, VoteOption};

use crate::client::VotingClient;
use crate::error::ClientError;
use crate::view::{render_options, render_participants, INCOMPLETE_DATA};
use crate::vote::VoteForm;

/// Participant names as last reported by the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantSnapshot {
    names: Vec<String>,
    generation: u64,
}

impl ParticipantSnapshot {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn render(&self) -> String {
        render_participants(&self.names)
    }
}

/// Position-indexed options as last reported by the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionSnapshot {
    options: Vec<VoteOption>,
    names: Vec<String>,
    generation: u64,
}

impl OptionSnapshot {
    pub fn options(&self) -> &[VoteOption] {
        &self.options
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Position of the first option named exactly `name`.
    ///
    /// Duplicate names are possible; the earliest one wins.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.position)
    }

    pub fn get(&self, position: usize) -> Option<&VoteOption> {
        self.options.get(position)
    }

    /// One vote form per option, with its position bound now.
    pub fn vote_forms(&self) -> Vec<VoteForm> {
        self.options
            .iter()
            .map(|o| VoteForm::new(o, self.generation))
            .collect()
    }

    pub fn render(&self) -> String {
        render_options(&self.names)
    }
}

#[derive(Debug, Default)]
pub struct RegistryCache {
    participants: ParticipantSnapshot,
    options: OptionSnapshot,
}

impl RegistryCache {
    pub fn participants(&self) -> &ParticipantSnapshot {
        &self.participants
    }

    pub fn options(&self) -> &OptionSnapshot {
        &self.options
    }

    /// Replace the participant snapshot unless a newer one is already held.
    pub fn replace_participants(&mut self, names: Vec<String>, ticket: u64) -> bool {
        if ticket < self.participants.generation {
            return false;
        }
        self.participants = ParticipantSnapshot {
            names,
            generation: ticket,
        };
        true
    }

    /// Replace the option snapshot unless a newer one is already held.
    pub fn replace_options(&mut self, names: Vec<String>, ticket: u64) -> bool {
        if ticket < self.options.generation {
            return false;
        }
        self.options = OptionSnapshot {
            options: VoteOption::from_names(names.clone()),
            names,
            generation: ticket,
        };
        true
    }
}

fn require_filled(value: &str) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Validation(INCOMPLETE_DATA.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Both fields must be non-empty.
pub fn validate_participant(address: &str, name: &str) -> Result<Participant, ClientError> {
    let address = require_filled(address)?;
    let name = require_filled(name)?;
    Ok(Participant { address, name })
}

pub fn validate_option_name(name: &str) -> Result<String, ClientError> {
    require_filled(name)
}

impl VotingClient {
    /// Fetch all participant names and replace the cached snapshot.
    pub async fn refresh_participants(&self) -> Result<String, ClientError> {
        let ticket = self.next_ticket();
        let names = self
            .gateway()
            .list_participant_names()
            .await
            .map_err(|e| self.log_refresh_failure("participants", e))?;
        let mut state = self.state();
        if !state.registry.replace_participants(names, ticket) {
            tracing::debug!(ticket, "discarding stale participant list");
        }
        Ok(state.registry.participants().render())
    }

    /// Fetch all option names and replace the position-indexed snapshot.
    pub async fn refresh_options(&self) -> Result<String, ClientError> {
        let ticket = self.next_ticket();
        let names = self
            .gateway()
            .list_option_names()
            .await
            .map_err(|e| self.log_refresh_failure("options", e))?;
        let mut state = self.state();
        if !state.registry.replace_options(names, ticket) {
            tracing::debug!(ticket, "discarding stale option list");
        }
        Ok(state.registry.options().render())
    }

    /// Register a participant with the ledger, then refresh participants.
    pub async fn register_participant(&self, address: &str, name: &str) -> Result<(), ClientError> {
        let participant = match validate_participant(address, name) {
            Ok(p) => p,
            Err(e) => return Err(self.state().raise(e)),
        };

        if let Err(e) = self.gateway().register_participant(&participant).await {
            return Err(self.recover("register participant", e).await);
        }
        tracing::info!(address = %participant.address, name = %participant.name, "participant registered");

        self.state().inputs.clear_participant();
        self.refresh_participants().await.map(|_| ())
    }

    /// Add a voting option to the ledger, then refresh options.
    pub async fn add_option(&self, name: &str) -> Result<(), ClientError> {
        let name = match validate_option_name(name) {
            Ok(n) => n,
            Err(e) => return Err(self.state().raise(e)),
        };

        if let Err(e) = self.gateway().add_option(&name).await {
            return Err(self.recover("add option", e).await);
        }
        tracing::info!(option = %name, "option added");

        self.state().inputs.option_name.clear();
        self.refresh_options().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_picks_first_exact_match() {
        let mut cache = RegistryCache::default();
        cache.replace_options(names(&["Red", "Blue", "Red"]), 1);
        assert_eq!(cache.options().resolve("Blue"), Some(1));
        assert_eq!(cache.options().resolve("Red"), Some(0));
        assert_eq!(cache.options().resolve("red"), None);
    }

    #[test]
    fn replacement_is_total() {
        let mut cache = RegistryCache::default();
        cache.replace_participants(names(&["Alice", "Bob"]), 1);
        cache.replace_participants(names(&["Carol"]), 2);
        assert_eq!(cache.participants().names(), &names(&["Carol"])[..]);
    }

    #[test]
    fn older_ticket_never_overwrites_newer() {
        let mut cache = RegistryCache::default();
        assert!(cache.replace_options(names(&["Red", "Blue"]), 5));
        assert!(!cache.replace_options(names(&["Red"]), 4));
        assert_eq!(cache.options().len(), 2);
        assert_eq!(cache.options().generation(), 5);
    }

    #[test]
    fn empty_snapshots_render_sentinels() {
        let cache = RegistryCache::default();
        assert_eq!(cache.participants().render(), "No participants.");
        assert_eq!(cache.options().render(), "No options.");
    }

    #[test]
    fn vote_forms_bind_positions() {
        let mut cache = RegistryCache::default();
        cache.replace_options(names(&["Red", "Blue"]), 3);
        let forms = cache.options().vote_forms();
        assert_eq!(forms[1].position(), 1);
        assert_eq!(forms[1].option_name(), "Blue");
        assert_eq!(forms[1].generation(), 3);
    }

    #[test]
    fn validation_rejects_blank_fields() {
        assert!(matches!(
            validate_participant("", "Alice"),
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            validate_participant("0xa", "  "),
            Err(ClientError::Validation(_))
        ));
        assert!(validate_option_name("").is_err());
        assert_eq!(validate_option_name(" Red ").unwrap(), "Red");
    }
}
