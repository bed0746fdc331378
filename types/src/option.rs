//! Voting options.

use serde::{Deserialize, Serialize};

/// A named choice with a stable, 0-based position.
///
/// Positions are assigned in creation order and never reused: options are
/// append-only, so the position is the canonical reference a vote carries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteOption {
    pub name: String,
    pub position: usize,
}

impl VoteOption {
    /// Build the position-indexed list from the ledger's ordered names.
    pub fn from_names(names: Vec<String>) -> Vec<Self> {
        names
            .into_iter()
            .enumerate()
            .map(|(position, name)| Self { name, position })
            .collect()
    }
}
