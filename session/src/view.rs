//! What the UI renders: texts, inputs, the alert, and the affordance pair.

use lvote_types::{Balance, Budget, Phase};

use crate::vote::VoteForm;

pub const NO_PARTICIPANTS: &str = "No participants.";
pub const NO_OPTIONS: &str = "No options.";
pub const UNKNOWN_WINNER: &str = "unknown";
pub const INCOMPLETE_DATA: &str = "Incomplete data!";

pub fn render_participants(names: &[String]) -> String {
    if names.is_empty() {
        NO_PARTICIPANTS.to_string()
    } else {
        names.join(", ")
    }
}

pub fn render_options(names: &[String]) -> String {
    if names.is_empty() {
        NO_OPTIONS.to_string()
    } else {
        names.join(", ")
    }
}

/// Token balance on the first line, native coin on the second.
pub fn render_balance(balance: &Balance) -> String {
    format!(
        "My balance: {} LVT\n{} ETH",
        balance.token_balance, balance.native_balance
    )
}

pub fn render_winner(winner: &str) -> String {
    let winner = winner.trim();
    format!(
        "Last winner: {}",
        if winner.is_empty() { UNKNOWN_WINNER } else { winner }
    )
}

/// Text fields of the forms. Cleared by the operation that consumed them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputFields {
    pub participant_address: String,
    pub participant_name: String,
    pub option_name: String,
    pub weight: String,
}

impl InputFields {
    pub fn clear_participant(&mut self) {
        self.participant_address.clear();
        self.participant_name.clear();
    }
}

/// A rendered, settled snapshot of the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub phase: Phase,
    pub budget: Option<Budget>,
    pub open_enabled: bool,
    pub close_enabled: bool,
    pub participants: String,
    /// `None` while the option list is hidden (no session yet).
    pub options: Option<String>,
    /// One bound vote form per option, in position order.
    pub vote_forms: Vec<VoteForm>,
    /// `None` until a balance has been fetched in the current phase.
    pub balance: Option<String>,
    pub last_winner: Option<String>,
    pub alert: Option<String>,
    pub inputs: InputFields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lvote_types::NativeAmount;

    #[test]
    fn empty_lists_render_sentinels() {
        assert_eq!(render_participants(&[]), "No participants.");
        assert_eq!(render_options(&[]), "No options.");
    }

    #[test]
    fn lists_are_comma_joined() {
        let names = vec!["Alice".to_string(), "Bob".to_string()];
        assert_eq!(render_participants(&names), "Alice, Bob");
    }

    #[test]
    fn empty_winner_is_unknown() {
        assert_eq!(render_winner(""), "Last winner: unknown");
        assert_eq!(render_winner("Blue"), "Last winner: Blue");
    }

    #[test]
    fn balance_shows_both_units() {
        let balance = Balance::new(
            40,
            NativeAmount::parse_decimal("1.5").unwrap(),
        );
        assert_eq!(render_balance(&balance), "My balance: 40 LVT\n1.5 ETH");
    }
}
