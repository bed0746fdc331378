//! The voting session phase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the single active session is in its lifecycle.
///
/// `Idle → Voting → Ended`, and `Ended` may start over with a new session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session has been opened yet.
    #[default]
    Idle,
    /// A session is open and accepting votes.
    Voting,
    /// The last session was closed; a winner may be available.
    Ended,
}

impl Phase {
    /// Whether a new session may be opened from this phase.
    pub fn can_open(&self) -> bool {
        matches!(self, Self::Idle | Self::Ended)
    }

    /// Whether the current session may be closed from this phase.
    pub fn can_close(&self) -> bool {
        matches!(self, Self::Voting)
    }

    /// Whether votes are accepted in this phase.
    pub fn accepts_votes(&self) -> bool {
        matches!(self, Self::Voting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Voting => "voting",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
