//! The transient vote request sent to the ledger.

use serde::{Deserialize, Serialize};

use crate::amount::Weight;

/// One weighted vote, addressed to an option by position.
///
/// Never persisted client-side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub position: usize,
    pub weight: Weight,
}
