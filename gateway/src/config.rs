//! Backend selection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::contract::{ContractAbi, ContractGateway};
use crate::error::GatewayError;
use crate::gateway::LedgerGateway;
use crate::rest::RestGateway;

/// Which authoritative backend the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    #[default]
    Rest,
    Contract,
}

impl FromStr for GatewayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "contract" => Ok(Self::Contract),
            other => Err(format!("unknown gateway {other:?}, expected \"rest\" or \"contract\"")),
        }
    }
}

/// Everything needed to build a gateway.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub kind: GatewayKind,
    /// REST base URL or JSON-RPC node URL.
    pub endpoint: String,
    /// Deployed voting contract (contract backend only).
    pub contract_address: Option<String>,
    /// ABI description with `methodIdentifiers` (contract backend only).
    pub abi_path: Option<PathBuf>,
    /// Account that signs transactions on the node (contract backend only).
    pub account: Option<String>,
    pub request_timeout: Duration,
    pub receipt_poll_attempts: u32,
    pub receipt_poll_interval: Duration,
}

/// Build the configured gateway.
pub fn connect(config: &GatewayConfig) -> Result<Arc<dyn LedgerGateway>, GatewayError> {
    if config.request_timeout.is_zero() {
        return Err(GatewayError::Config("request timeout must be non-zero".into()));
    }
    match config.kind {
        GatewayKind::Rest => {
            let gateway = RestGateway::new(config.endpoint.clone(), config.request_timeout)?;
            tracing::info!(endpoint = %gateway.base_url(), "using REST ledger gateway");
            Ok(Arc::new(gateway))
        }
        GatewayKind::Contract => {
            let contract = config
                .contract_address
                .as_deref()
                .ok_or_else(|| GatewayError::Config("contract_address is required".into()))?;
            let abi_path = config
                .abi_path
                .as_deref()
                .ok_or_else(|| GatewayError::Config("abi_path is required".into()))?;
            let account = config
                .account
                .as_deref()
                .ok_or_else(|| GatewayError::Config("account is required".into()))?;

            let abi = ContractAbi::from_file(abi_path)?;
            let gateway = ContractGateway::new(
                config.endpoint.clone(),
                contract,
                account,
                abi,
                config.request_timeout,
            )?
            .with_receipt_polling(config.receipt_poll_attempts, config.receipt_poll_interval);
            tracing::info!(
                endpoint = %config.endpoint,
                contract = %gateway.contract_address(),
                "using contract ledger gateway"
            );
            Ok(Arc::new(gateway))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base(kind: GatewayKind) -> GatewayConfig {
        GatewayConfig {
            kind,
            endpoint: "http://localhost:3000".into(),
            contract_address: None,
            abi_path: None,
            account: None,
            request_timeout: Duration::from_secs(5),
            receipt_poll_attempts: 3,
            receipt_poll_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn rest_needs_only_endpoint() {
        let gw = connect(&base(GatewayKind::Rest)).unwrap();
        assert_eq!(gw.backend(), "rest");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = base(GatewayKind::Rest);
        config.request_timeout = Duration::ZERO;
        assert!(matches!(connect(&config), Err(GatewayError::Config(_))));
    }

    #[test]
    fn contract_requires_address_and_abi() {
        let err = connect(&base(GatewayKind::Contract)).err().unwrap();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn contract_from_abi_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", ContractAbi::full().to_json_string()).unwrap();

        let mut config = base(GatewayKind::Contract);
        config.endpoint = "http://127.0.0.1:8545".into();
        config.contract_address = Some("0x5fbdb2315678afecb367f032d93f642f64180aa3".into());
        config.account = Some("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".into());
        config.abi_path = Some(file.path().to_path_buf());

        let gw = connect(&config).unwrap();
        assert_eq!(gw.backend(), "contract");
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("REST".parse::<GatewayKind>().unwrap(), GatewayKind::Rest);
        assert_eq!("contract".parse::<GatewayKind>().unwrap(), GatewayKind::Contract);
        assert!("grpc".parse::<GatewayKind>().is_err());
    }
}
