//! Voting contract interface.
//!
//! Calldata and return values are encoded by `alloy-sol-types` from the
//! [`IVoting`] declaration. The deployed contract's method table (solc's
//! `methodIdentifiers`) is checked against it on load, and tells whether the
//! optional `votingActive()` getter exists.

use alloy_primitives::Address;
use alloy_sol_types::{sol, SolCall};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::GatewayError;

sol! {
    interface IVoting {
        function getAllParticipantNames() external view returns (string[] memory);
        function getAllOptionNames() external view returns (string[] memory);
        function balanceOf(address account) external view returns (uint256);
        function getLastWinner() external view returns (string memory);
        function addParticipant(address participant, string memory name) external;
        function addOption(string memory name) external;
        function startVoting(uint256 budget) external;
        function endVoting() external;
        function vote(uint256 position, uint256 weight) external;
        function votingActive() external view returns (bool);
    }
}

fn method<C: SolCall>() -> (&'static str, [u8; 4]) {
    (C::SIGNATURE, C::SELECTOR)
}

/// Methods every deployment must expose, as `(signature, selector)`.
pub fn required_methods() -> [(&'static str, [u8; 4]); 9] {
    [
        method::<IVoting::getAllParticipantNamesCall>(),
        method::<IVoting::getAllOptionNamesCall>(),
        method::<IVoting::balanceOfCall>(),
        method::<IVoting::getLastWinnerCall>(),
        method::<IVoting::addParticipantCall>(),
        method::<IVoting::addOptionCall>(),
        method::<IVoting::startVotingCall>(),
        method::<IVoting::endVotingCall>(),
        method::<IVoting::voteCall>(),
    ]
}

/// Method table of the deployed contract.
///
/// Read from the compiler's `methodIdentifiers` map (signature to 4-byte hex
/// selector), either at the top level of the JSON or under `evm`.
#[derive(Clone, Debug, Default)]
pub struct ContractAbi {
    selectors: HashMap<String, [u8; 4]>,
}

#[derive(Deserialize)]
struct AbiFile {
    #[serde(rename = "methodIdentifiers", default)]
    method_identifiers: Option<HashMap<String, String>>,
    #[serde(default)]
    evm: Option<EvmSection>,
}

#[derive(Deserialize)]
struct EvmSection {
    #[serde(rename = "methodIdentifiers", default)]
    method_identifiers: Option<HashMap<String, String>>,
}

impl ContractAbi {
    /// The table a contract implementing all of [`IVoting`] would publish.
    pub fn full() -> Self {
        let selectors = required_methods()
            .into_iter()
            .chain([method::<IVoting::votingActiveCall>()])
            .map(|(signature, selector)| (signature.to_string(), selector))
            .collect();
        Self { selectors }
    }

    pub fn from_json_str(s: &str) -> Result<Self, GatewayError> {
        let file: AbiFile = serde_json::from_str(s)
            .map_err(|e| GatewayError::Config(format!("invalid ABI description: {e}")))?;
        let identifiers = file
            .method_identifiers
            .or_else(|| file.evm.and_then(|evm| evm.method_identifiers))
            .ok_or_else(|| {
                GatewayError::Config("ABI description has no methodIdentifiers".into())
            })?;

        let mut selectors = HashMap::with_capacity(identifiers.len());
        for (signature, hex_selector) in identifiers {
            let raw = hex::decode(hex_selector.trim_start_matches("0x")).map_err(|e| {
                GatewayError::Config(format!("bad selector for {signature}: {e}"))
            })?;
            let selector: [u8; 4] = raw.as_slice().try_into().map_err(|_| {
                GatewayError::Config(format!("selector for {signature} is not 4 bytes"))
            })?;
            selectors.insert(signature, selector);
        }

        let abi = Self { selectors };
        for (signature, selector) in required_methods() {
            match abi.selectors.get(signature) {
                None => {
                    return Err(GatewayError::Config(format!(
                        "ABI description is missing {signature}"
                    )))
                }
                Some(listed) if *listed != selector => {
                    return Err(GatewayError::Config(format!(
                        "ABI description lists {signature} as 0x{}, expected 0x{}",
                        hex::encode(listed),
                        hex::encode(selector)
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(abi)
    }

    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("failed to read ABI {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Whether the deployment exposes `C` under its canonical selector.
    pub fn supports<C: SolCall>(&self) -> bool {
        self.selectors.get(C::SIGNATURE) == Some(&C::SELECTOR)
    }

    /// Render as a solc-style `{"methodIdentifiers": {..}}` document.
    pub fn to_json_string(&self) -> String {
        let identifiers: HashMap<&str, String> = self
            .selectors
            .iter()
            .map(|(signature, selector)| (signature.as_str(), hex::encode(selector)))
            .collect();
        serde_json::json!({ "methodIdentifiers": identifiers }).to_string()
    }
}

/// Parse a `0x`-prefixed 20-byte hex address.
pub fn parse_address(s: &str) -> Result<Address, GatewayError> {
    s.trim()
        .parse::<Address>()
        .map_err(|e| GatewayError::Abi(format!("bad address {s:?}: {e}")))
}
