//! REST binding of the ledger gateway.

use async_trait::async_trait;
use lvote_types::{parse_token_count, Balance, Budget, NativeAmount, Participant, VoteRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::GatewayError;
use crate::gateway::LedgerGateway;

pub const PARTICIPANT_NAMES_PATH: &str = "/get-all-participant-names";
pub const OPTION_NAMES_PATH: &str = "/get-all-option-names";
pub const BALANCE_PATH: &str = "/get-my-balance";
pub const LAST_WINNER_PATH: &str = "/get-last-winner";
pub const ADD_PARTICIPANT_PATH: &str = "/add-participant";
pub const ADD_OPTION_PATH: &str = "/add-option";
pub const START_VOTING_PATH: &str = "/start-voting";
pub const END_VOTING_PATH: &str = "/end-voting";
pub const VOTE_PATH: &str = "/vote";

/// HTTP client for a voting service that keeps the ledger server-side.
///
/// Wraps `reqwest::Client` with the service's base URL; each gateway
/// operation maps to one endpoint.
#[derive(Clone)]
pub struct RestGateway {
    http: reqwest::Client,
    base_url: String,
}

impl RestGateway {
    /// Create a gateway for the given base URL (e.g. `http://localhost:3000`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to create HTTP client: {e}")))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(Self::check(response).await?.json::<T>().await?)
    }

    async fn get_text(&self, path: &str) -> Result<String, GatewayError> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(Self::check(response).await?.text().await?)
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<(), GatewayError> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Balance response from the service.
///
/// Either field may arrive as a JSON number or as a string.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    pub balance: Value,
    #[serde(rename = "ethBalance", default)]
    pub eth_balance: Value,
}

impl BalanceResponse {
    pub fn into_balance(self) -> Result<Balance, GatewayError> {
        let token_balance = match &self.balance {
            Value::Number(n) => match n.as_u64() {
                Some(v) => u128::from(v),
                None => parse_token_count(&n.to_string())
                    .map_err(|e| GatewayError::InvalidResponse(format!("bad token balance: {e}")))?,
            },
            Value::String(s) => parse_token_count(s)
                .map_err(|e| GatewayError::InvalidResponse(format!("bad token balance: {e}")))?,
            other => {
                return Err(GatewayError::InvalidResponse(format!(
                    "bad token balance {other}"
                )))
            }
        };
        let native_balance = match &self.eth_balance {
            Value::Null => NativeAmount::ZERO,
            Value::Number(n) => NativeAmount::parse_decimal(&n.to_string())
                .map_err(|e| GatewayError::InvalidResponse(format!("bad native balance: {e}")))?,
            Value::String(s) => NativeAmount::parse_decimal(s)
                .map_err(|e| GatewayError::InvalidResponse(format!("bad native balance: {e}")))?,
            other => {
                return Err(GatewayError::InvalidResponse(format!(
                    "bad native balance {other}"
                )))
            }
        };
        Ok(Balance::new(token_balance, native_balance))
    }
}

#[async_trait]
impl LedgerGateway for RestGateway {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn list_participant_names(&self) -> Result<Vec<String>, GatewayError> {
        self.get_json(PARTICIPANT_NAMES_PATH).await
    }

    async fn list_option_names(&self) -> Result<Vec<String>, GatewayError> {
        self.get_json(OPTION_NAMES_PATH).await
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, GatewayError> {
        // the service reports its own account; `address` is advisory
        let response = self
            .http
            .get(self.url(BALANCE_PATH))
            .query(&[("address", address)])
            .send()
            .await?;
        let body: BalanceResponse = Self::check(response).await?.json().await?;
        body.into_balance()
    }

    async fn get_last_winner(&self) -> Result<String, GatewayError> {
        Ok(self.get_text(LAST_WINNER_PATH).await?.trim().to_string())
    }

    async fn register_participant(&self, participant: &Participant) -> Result<(), GatewayError> {
        self.post(
            ADD_PARTICIPANT_PATH,
            Some(json!({ "address": participant.address, "name": participant.name })),
        )
        .await
    }

    async fn add_option(&self, name: &str) -> Result<(), GatewayError> {
        self.post(ADD_OPTION_PATH, Some(json!({ "name": name }))).await
    }

    async fn open_session(&self, budget: Budget) -> Result<(), GatewayError> {
        self.post(START_VOTING_PATH, Some(json!({ "budget": budget.get().to_string() })))
            .await
    }

    async fn close_session(&self) -> Result<(), GatewayError> {
        self.post(END_VOTING_PATH, None).await
    }

    async fn cast_vote(&self, vote: VoteRequest) -> Result<(), GatewayError> {
        self.post(
            VOTE_PATH,
            Some(json!({ "position": vote.position, "weight": vote.weight.get().to_string() })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let gw = RestGateway::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(gw.base_url(), "http://localhost:3000");
        assert_eq!(
            gw.url(PARTICIPANT_NAMES_PATH),
            "http://localhost:3000/get-all-participant-names"
        );
    }

    #[test]
    fn balance_accepts_numbers_and_strings() {
        let body: BalanceResponse =
            serde_json::from_str(r#"{"balance": 120, "ethBalance": "0.5"}"#).unwrap();
        let balance = body.into_balance().unwrap();
        assert_eq!(balance.token_balance, 120);
        assert_eq!(balance.native_balance.to_string(), "0.5");

        let body: BalanceResponse =
            serde_json::from_str(r#"{"balance": "7", "ethBalance": 2}"#).unwrap();
        let balance = body.into_balance().unwrap();
        assert_eq!(balance.token_balance, 7);
        assert_eq!(balance.native_balance.to_string(), "2");
    }

    #[test]
    fn balance_without_native_defaults_to_zero() {
        let body: BalanceResponse = serde_json::from_str(r#"{"balance": 3}"#).unwrap();
        assert_eq!(body.into_balance().unwrap().native_balance, NativeAmount::ZERO);
    }

    #[test]
    fn balance_accepts_exponent_numbers() {
        let body: BalanceResponse =
            serde_json::from_str(r#"{"balance": 1e3, "ethBalance": 1e-7}"#).unwrap();
        let balance = body.into_balance().unwrap();
        assert_eq!(balance.token_balance, 1000);
        assert_eq!(balance.native_balance.to_string(), "0.0000001");

        let body: BalanceResponse =
            serde_json::from_str(r#"{"balance": 5, "ethBalance": 1.5e-7}"#).unwrap();
        assert_eq!(body.into_balance().unwrap().native_balance.to_string(), "0.00000015");
    }

    #[test]
    fn balance_rejects_fractional_tokens() {
        let body: BalanceResponse = serde_json::from_str(r#"{"balance": 2.5}"#).unwrap();
        assert!(matches!(
            body.into_balance(),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn balance_rejects_negative() {
        let body: BalanceResponse = serde_json::from_str(r#"{"balance": -1}"#).unwrap();
        assert!(matches!(
            body.into_balance(),
            Err(GatewayError::InvalidResponse(_))
        ));
    }
}
