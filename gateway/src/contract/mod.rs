//! Smart-contract binding of the ledger gateway.
//!
//! Talks JSON-RPC to an Ethereum-style node. Reads are `eth_call`s against
//! the voting contract; writes are `eth_sendTransaction`s from an account the
//! node manages, followed by bounded receipt polling. Key management stays on
//! the node.

pub mod abi;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use lvote_types::{Balance, Budget, NativeAmount, Participant, Phase, VoteRequest};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::GatewayError;
use crate::gateway::LedgerGateway;

pub use abi::{ContractAbi, IVoting};

/// Gateway to a deployed voting contract.
pub struct ContractGateway {
    http: reqwest::Client,
    rpc_url: String,
    contract: Address,
    from: String,
    abi: ContractAbi,
    receipt_poll_attempts: u32,
    receipt_poll_interval: Duration,
    next_id: AtomicU64,
}

impl ContractGateway {
    pub fn new(
        rpc_url: impl Into<String>,
        contract: &str,
        from: impl Into<String>,
        abi: ContractAbi,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let contract = abi::parse_address(contract)
            .map_err(|e| GatewayError::Config(format!("contract address: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            contract,
            from: from.into(),
            abi,
            receipt_poll_attempts: 20,
            receipt_poll_interval: Duration::from_millis(500),
            next_id: AtomicU64::new(1),
        })
    }

    /// Override how long writes wait for their receipt.
    pub fn with_receipt_polling(mut self, attempts: u32, interval: Duration) -> Self {
        self.receipt_poll_attempts = attempts.max(1);
        self.receipt_poll_interval = interval;
        self
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Send a JSON-RPC request and return its `result` field.
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let response = self.http.post(&self.rpc_url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        if let Some(err) = json.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(GatewayError::Rpc { code, message });
        }
        json.get("result")
            .cloned()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("{method}: no result field")))
    }

    fn calldata<C: SolCall>(call: &C) -> String {
        format!("0x{}", hex::encode(call.abi_encode()))
    }

    /// Read-only contract call.
    async fn call<C: SolCall + Send>(&self, call: C) -> Result<C::Return, GatewayError> {
        let data = Self::calldata(&call);
        let result = self
            .rpc_call(
                "eth_call",
                json!([{ "to": self.contract.to_string(), "data": data }, "latest"]),
            )
            .await?;
        let hex_str = result.as_str().ok_or_else(|| {
            GatewayError::InvalidResponse(format!("{}: result is not a string", C::SIGNATURE))
        })?;
        let bytes = hex::decode(hex_str.trim_start_matches("0x"))
            .map_err(|e| GatewayError::InvalidResponse(format!("{}: {e}", C::SIGNATURE)))?;
        C::abi_decode_returns(&bytes, true)
            .map_err(|e| GatewayError::Abi(format!("{}: {e}", C::SIGNATURE)))
    }

    /// State-changing contract call; resolves once the transaction is mined.
    async fn transact<C: SolCall + Send>(&self, call: C) -> Result<(), GatewayError> {
        let data = Self::calldata(&call);
        let tx_hash = self
            .rpc_call(
                "eth_sendTransaction",
                json!([{ "from": self.from, "to": self.contract.to_string(), "data": data }]),
            )
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::InvalidResponse(format!("{}: no tx hash", C::SIGNATURE)))?;

        tracing::debug!(method = C::SIGNATURE, tx = %tx_hash, "transaction sent");
        self.wait_for_receipt(&tx_hash).await
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<(), GatewayError> {
        for attempt in 0..self.receipt_poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.receipt_poll_interval).await;
            }
            let receipt = self
                .rpc_call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if receipt.is_null() {
                continue;
            }
            return match receipt.get("status").and_then(Value::as_str) {
                Some("0x1") => Ok(()),
                Some(_) => Err(GatewayError::Reverted(tx_hash.to_string())),
                None => Err(GatewayError::InvalidResponse(format!(
                    "receipt for {tx_hash} has no status"
                ))),
            };
        }
        Err(GatewayError::ReceiptTimeout {
            tx: tx_hash.to_string(),
            attempts: self.receipt_poll_attempts,
        })
    }
}

fn to_u128(value: U256, what: &str) -> Result<u128, GatewayError> {
    u128::try_from(value).map_err(|_| GatewayError::Abi(format!("{what} exceeds 128 bits")))
}

#[async_trait]
impl LedgerGateway for ContractGateway {
    fn backend(&self) -> &'static str {
        "contract"
    }

    async fn list_participant_names(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.call(IVoting::getAllParticipantNamesCall {}).await?._0)
    }

    async fn list_option_names(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.call(IVoting::getAllOptionNamesCall {}).await?._0)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, GatewayError> {
        let account = abi::parse_address(address)?;
        let tokens = self.call(IVoting::balanceOfCall { account }).await?._0;
        let token_balance = to_u128(tokens, "token balance")?;

        let native = self
            .rpc_call("eth_getBalance", json!([account.to_string(), "latest"]))
            .await?;
        let native = native
            .as_str()
            .ok_or_else(|| GatewayError::InvalidResponse("eth_getBalance: not a string".into()))?;
        let native_balance = NativeAmount::parse_hex_quantity(native)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(Balance::new(token_balance, native_balance))
    }

    async fn get_last_winner(&self) -> Result<String, GatewayError> {
        Ok(self.call(IVoting::getLastWinnerCall {}).await?._0)
    }

    async fn register_participant(&self, participant: &Participant) -> Result<(), GatewayError> {
        let address = abi::parse_address(&participant.address)?;
        self.transact(IVoting::addParticipantCall {
            participant: address,
            name: participant.name.clone(),
        })
        .await
    }

    async fn add_option(&self, name: &str) -> Result<(), GatewayError> {
        self.transact(IVoting::addOptionCall {
            name: name.to_string(),
        })
        .await
    }

    async fn open_session(&self, budget: Budget) -> Result<(), GatewayError> {
        self.transact(IVoting::startVotingCall {
            budget: U256::from(budget.get()),
        })
        .await
    }

    async fn close_session(&self) -> Result<(), GatewayError> {
        self.transact(IVoting::endVotingCall {}).await
    }

    async fn cast_vote(&self, vote: VoteRequest) -> Result<(), GatewayError> {
        self.transact(IVoting::voteCall {
            position: U256::from(vote.position as u64),
            weight: U256::from(vote.weight.get()),
        })
        .await
    }

    /// Without a recorded winner an ended session reads as `Idle`; the
    /// client keeps its own confirmed `Ended` in that case.
    async fn session_phase(&self) -> Result<Option<Phase>, GatewayError> {
        if !self.abi.supports::<IVoting::votingActiveCall>() {
            return Ok(None);
        }
        if self.call(IVoting::votingActiveCall {}).await?._0 {
            return Ok(Some(Phase::Voting));
        }
        let winner = self.get_last_winner().await?;
        Ok(Some(if winner.is_empty() { Phase::Idle } else { Phase::Ended }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

    #[test]
    fn rejects_malformed_contract_address() {
        let result = ContractGateway::new(
            "http://127.0.0.1:8545",
            "not-an-address",
            CONTRACT,
            ContractAbi::full(),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[test]
    fn calldata_is_hex_prefixed() {
        let data = ContractGateway::calldata(&IVoting::endVotingCall {});
        assert_eq!(data, "0xc3403ddf");
    }

    #[test]
    fn oversized_uint_is_abi_error() {
        assert_eq!(to_u128(U256::from(7u64), "x").unwrap(), 7);
        assert!(matches!(
            to_u128(U256::MAX, "token balance"),
            Err(GatewayError::Abi(_))
        ));
    }
}
