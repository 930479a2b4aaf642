//! JSON-RPC client for the configured EVM endpoint.
//!
//! Every chain interaction in the wallet goes through [`RpcClient::call`], which
//! attaches the wallet SDK API key and turns JSON-RPC error objects into
//! `anyhow` errors carrying the node's message.

use anyhow::{anyhow, Context, Result};
use ethers_core::types::U256;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

#[derive(Clone, Debug)]
pub struct RpcClient {
    http: Client,
    url: Url,
    api_key: SecretString,
}

impl RpcClient {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            http: Client::new(),
            url,
            api_key,
        }
    }

    /// Sends one JSON-RPC request and returns its `result` member.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        debug!("rpc -> {}", method);

        let resp: Value = self
            .http
            .post(self.url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{} request failed", method))?
            .json()
            .await
            .with_context(|| format!("{} returned a non-JSON body", method))?;

        if let Some(err) = resp.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(anyhow!("RPC error in {}: {}", method, message));
        }

        resp.get("result")
            .cloned()
            .ok_or_else(|| anyhow!("RPC response to {} missing 'result' field: {}", method, resp))
    }

    /// Calls a method whose result is a hex quantity.
    pub async fn call_quantity(&self, method: &str, params: Value) -> Result<U256> {
        let result = self.call(method, params).await?;
        parse_quantity(&result).with_context(|| format!("{} returned a malformed quantity", method))
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let id = self.call_quantity("eth_chainId", json!([])).await?;
        if id.bits() > 64 {
            return Err(anyhow!("eth_chainId returned {} which does not fit in 64 bits", id));
        }
        Ok(id.low_u64())
    }
}

/// Parses a `0x`-prefixed hex quantity as returned by EVM nodes.
pub fn parse_quantity(v: &Value) -> Result<U256> {
    let s = v.as_str().ok_or_else(|| anyhow!("expected hex string, got {}", v))?;
    let digits = s.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| anyhow!("invalid hex quantity '{}': {}", s, e))
}
