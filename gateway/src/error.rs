use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transaction {0} reverted")]
    Reverted(String),

    #[error("transaction {tx} not mined after {attempts} receipt polls")]
    ReceiptTimeout { tx: String, attempts: u32 },

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("gateway configuration error: {0}")]
    Config(String),

    #[error("rejected by ledger: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}
