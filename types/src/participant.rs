//! Registered participants.

use serde::{Deserialize, Serialize};

/// An address/name pair entitled to hold balance and vote.
///
/// Immutable once registered; the ledger enforces address uniqueness.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub address: String,
    pub name: String,
}

impl Participant {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}
