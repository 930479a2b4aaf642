//! OpenRouter credits API: creates Coinbase Commerce charges payable on-chain.

use ethers_core::types::{Address, U256};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("OpenRouter request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OpenRouter API error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected OpenRouter response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Deserialize)]
struct ChargeEnvelope {
    data: CoinbaseCharge,
}

/// A charge created by OpenRouter, carrying the transfer intent to settle it.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseCharge {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    pub web3_data: Web3Data,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Web3Data {
    pub transfer_intent: TransferIntent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferIntent {
    pub call_data: IntentCallData,
    pub metadata: IntentMetadata,
}

/// Arguments of the settlement contract's transfer call. Amounts are decimal
/// strings in the stablecoin's smallest unit.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentCallData {
    pub recipient_amount: String,
    pub fee_amount: String,
    pub deadline: String,
    pub recipient: String,
    #[serde(default)]
    pub recipient_currency: Option<String>,
    #[serde(default)]
    pub refund_destination: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntentMetadata {
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub contract_address: String,
    #[serde(default)]
    pub sender: Option<String>,
}

impl IntentCallData {
    /// Recipient amount plus fee, in smallest units.
    pub fn total_amount(&self) -> Result<U256, OpenRouterError> {
        let parse = |field: &str, v: &str| {
            U256::from_dec_str(v.trim())
                .map_err(|e| OpenRouterError::Malformed(format!("{} '{}': {}", field, v, e)))
        };
        let recipient = parse("recipient_amount", &self.recipient_amount)?;
        let fee = parse("fee_amount", &self.fee_amount)?;
        recipient
            .checked_add(fee)
            .ok_or_else(|| OpenRouterError::Malformed("amount overflow".into()))
    }
}

#[derive(Clone, Debug)]
pub struct OpenRouterClient {
    http: Client,
    base_url: Url,
    api_key: SecretString,
}

impl OpenRouterClient {
    pub fn new(base_url: Url, api_key: SecretString) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// `POST /credits/coinbase`: asks OpenRouter for a charge of `amount_usd`
    /// to be paid by `sender` on `chain_id`.
    pub async fn create_coinbase_charge(
        &self,
        amount_usd: f64,
        sender: Address,
        chain_id: u64,
    ) -> Result<CoinbaseCharge, OpenRouterError> {
        let url = self.endpoint("credits/coinbase");
        let payload = json!({
            "amount": amount_usd,
            "sender": format!("{:?}", sender),
            "chain_id": chain_id,
        });
        info!("Requesting OpenRouter charge of ${} on chain {}", amount_usd, chain_id);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(OpenRouterError::Status { status, body });
        }
        debug!("OpenRouter charge response: {}", body);

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| OpenRouterError::Malformed(format!("invalid JSON: {}", e)))?;
        let envelope: ChargeEnvelope = serde_json::from_value(value)
            .map_err(|e| OpenRouterError::Malformed(e.to_string()))?;
        Ok(envelope.data)
    }
}
