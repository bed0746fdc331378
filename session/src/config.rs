//! Client configuration with TOML file support.

use lvote_gateway::{GatewayConfig, GatewayKind};
use lvote_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ClientError;

/// Configuration for a voting client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Command-line flags override
/// whatever the file says.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Which backend to talk to: "rest" or "contract".
    #[serde(default)]
    pub gateway: GatewayKind,

    /// REST base URL, or the JSON-RPC node URL for the contract backend.
    #[serde(default = "default_gateway_endpoint")]
    pub gateway_endpoint: String,

    /// Deployed voting contract address (contract backend only).
    #[serde(default)]
    pub contract_address: Option<String>,

    /// Path to the contract's ABI description (contract backend only).
    #[serde(default)]
    pub abi_path: Option<PathBuf>,

    /// The account whose balance is shown and which sends transactions.
    #[serde(default)]
    pub account: String,

    /// Show options before the first session has been opened.
    #[serde(default)]
    pub always_show_options: bool,

    /// Per-request timeout for gateway calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How many times to poll for a transaction receipt before giving up.
    #[serde(default = "default_receipt_poll_attempts")]
    pub receipt_poll_attempts: u32,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_gateway_endpoint() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_receipt_poll_attempts() -> u32 {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        let config: Self = toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.receipt_poll_attempts == 0 {
            return Err(ClientError::Config(
                "receipt_poll_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The gateway half of this configuration.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            kind: self.gateway,
            endpoint: self.gateway_endpoint.clone(),
            contract_address: self.contract_address.clone(),
            abi_path: self.abi_path.clone(),
            account: (!self.account.trim().is_empty()).then(|| self.account.trim().to_string()),
            request_timeout: self.request_timeout(),
            receipt_poll_attempts: self.receipt_poll_attempts,
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::default(),
            gateway_endpoint: default_gateway_endpoint(),
            contract_address: None,
            abi_path: None,
            account: String::new(),
            always_show_options: false,
            request_timeout_secs: default_request_timeout_secs(),
            receipt_poll_attempts: default_receipt_poll_attempts(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ClientConfig {
            account: "0xabc".into(),
            ..ClientConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ClientConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ClientConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.gateway, GatewayKind::Rest);
        assert_eq!(config.gateway_endpoint, "http://localhost:3000");
        assert!(!config.always_show_options);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.receipt_poll_attempts, 20);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            gateway = "contract"
            gateway_endpoint = "http://127.0.0.1:8545"
            contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            abi_path = "build/Voting.json"
            account = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            always_show_options = true
        "#;
        let config = ClientConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.gateway, GatewayKind::Contract);
        assert!(config.always_show_options);
        assert_eq!(config.abi_path, Some(PathBuf::from("build/Voting.json")));
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn unknown_gateway_is_config_error() {
        let err = ClientConfig::from_toml_str(r#"gateway = "grpc""#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn json_log_format_is_typed() {
        let config = ClientConfig::from_toml_str(r#"log_format = "json""#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_log_format_is_config_error() {
        let err = ClientConfig::from_toml_str(r#"log_format = "xml""#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn zero_timeout_is_config_error() {
        let err = ClientConfig::from_toml_str("request_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, ClientError::Config(msg) if msg.contains("request_timeout_secs")));
        let err = ClientConfig::from_toml_str("receipt_poll_attempts = 0").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ClientConfig::from_toml_file("/nonexistent/lvote.toml");
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "account = \"0xabc\"\nrequest_timeout_secs = 5").unwrap();
        let config = ClientConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.account, "0xabc");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn gateway_config_carries_backend_settings() {
        let config = ClientConfig {
            account: " 0xabc ".into(),
            receipt_poll_attempts: 3,
            ..ClientConfig::default()
        };
        let gw = config.gateway_config();
        assert_eq!(gw.kind, GatewayKind::Rest);
        assert_eq!(gw.account.as_deref(), Some("0xabc"));
        assert_eq!(gw.receipt_poll_attempts, 3);

        let blank = ClientConfig::default().gateway_config();
        assert_eq!(blank.account, None);
    }
}
