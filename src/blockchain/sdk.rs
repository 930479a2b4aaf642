//! The seam between the MCP layer and the wallet SDK.
//!
//! Tool calls are translated into SDK *actions*: a name plus a JSON argument
//! object, mirroring how gasless wallet SDKs expose their action catalog.
//! [`WalletSdk`] is that action surface; [`SdkConnector`] builds one client per
//! signing key and is what the session store calls on first use.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use ethers_core::types::Address;
use secrecy::SecretString;
use serde_json::Value;
use url::Url;

/// Action identifiers understood by the wallet SDK.
pub mod actions {
    pub const GET_ADDRESS: &str = "get_address";
    pub const GET_BALANCE: &str = "get_balance";
    pub const SMART_TRANSFER: &str = "smart_transfer";
    pub const SMART_SWAP: &str = "smart_swap";
    /// Handled in-process by the credit-purchase flow rather than the SDK.
    pub const BUY_OPENROUTER_CREDITS: &str = "buy_openrouter_credits";
}

/// A configured wallet client bound to one signing key and one chain.
#[async_trait]
pub trait WalletSdk: Send + Sync {
    fn chain_id(&self) -> u64;

    fn address(&self) -> Address;

    /// Runs one SDK action. Results are usually strings; anything else is
    /// stringified by the caller.
    async fn run_action(&self, action: &str, args: Value) -> Result<Value>;
}

/// Everything besides the signing key needed to build a wallet client.
#[derive(Clone, Debug)]
pub struct WalletSettings {
    pub rpc_url: Url,
    pub api_key: SecretString,
    pub chain_id: u64,
}

#[async_trait]
pub trait SdkConnector: Send + Sync {
    async fn connect(
        &self,
        signing_key: &SecretString,
        settings: &WalletSettings,
    ) -> Result<Arc<dyn WalletSdk>>;
}
