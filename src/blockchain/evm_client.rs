// src/blockchain/evm_client.rs

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers_core::types::{Address, TransactionRequest};
use ethers_core::utils::to_checksum;
use ethers_signers::{LocalWallet, Signer};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::info;
use zeroize::Zeroizing;

use crate::blockchain::{
    chains::{self, ChainInfo},
    client::RpcClient,
    models::{render_balances, GetBalanceArgs, SmartSwapArgs, SmartTransferArgs},
    nonce_manager::NonceManager,
    sdk::{actions, SdkConnector, WalletSdk, WalletSettings},
    services::{
        balance,
        swap::{self, SwapAsset},
        token, transactions,
    },
    units::{format_token_amount, parse_token_amount},
};

/// Wallet SDK client for EVM-compatible chains, speaking raw JSON-RPC.
#[derive(Clone)]
pub struct EvmWallet {
    rpc: RpcClient,
    wallet: LocalWallet,
    chain: ChainInfo,
    nonce_manager: NonceManager,
}

impl EvmWallet {
    /// Builds a client for `signing_key`, verifying that the endpoint serves the
    /// configured chain.
    pub async fn connect(signing_key: &SecretString, settings: &WalletSettings) -> Result<Self> {
        let key_hex = signing_key.expose_secret();
        let key_bytes = Zeroizing::new(
            hex::decode(key_hex.trim_start_matches("0x")).context("signing key is not valid hex")?,
        );
        let wallet = LocalWallet::from_bytes(&key_bytes)
            .map_err(|e| anyhow!("Invalid private key: {}", e))?
            .with_chain_id(settings.chain_id);

        let rpc = RpcClient::new(settings.rpc_url.clone(), settings.api_key.clone());
        let reported = rpc
            .chain_id()
            .await
            .context("failed to reach the RPC endpoint")?;
        if reported != settings.chain_id {
            return Err(anyhow!(
                "RPC endpoint serves chain {} but CHAIN_ID is {}",
                reported,
                settings.chain_id
            ));
        }

        let chain = chains::lookup(settings.chain_id).copied().unwrap_or(ChainInfo {
            chain_id: settings.chain_id,
            name: "EVM chain",
            native_symbol: "eth",
            native_decimals: 18,
            usdc: None,
            v2_router: None,
        });

        info!(
            "Wallet {} connected on {} ({})",
            to_checksum(&wallet.address(), None),
            chain.name,
            chain.chain_id
        );

        Ok(Self {
            rpc,
            wallet,
            chain,
            nonce_manager: NonceManager::new(),
        })
    }

    fn is_native(&self, token: &str) -> bool {
        chains::is_native_sentinel(token) || token.trim().eq_ignore_ascii_case(self.chain.native_symbol)
    }

    async fn get_balance(&self, args: GetBalanceArgs) -> Result<String> {
        let tokens = args
            .token_addresses
            .iter()
            .filter(|t| !self.is_native(t))
            .map(|t| token::parse_address(t))
            .collect::<Result<Vec<_>>>()?;
        let balances = balance::get_balances(&self.rpc, &self.chain, self.wallet.address(), &tokens).await?;
        Ok(render_balances(&balances))
    }

    async fn smart_transfer(&self, args: SmartTransferArgs) -> Result<String> {
        let destination = token::parse_address(&args.destination)?;
        let owner = self.wallet.address();

        let (tx, amount, symbol, decimals, held) = if self.is_native(&args.token_address) {
            let decimals = self.chain.native_decimals;
            let amount = parse_token_amount(&args.amount, decimals)?;
            let held = balance::native_balance(&self.rpc, owner).await?;
            let tx = TransactionRequest::new().to(destination).value(amount);
            (tx, amount, self.chain.native_symbol.to_uppercase(), decimals, held)
        } else {
            let token_address = token::parse_address(&args.token_address)?;
            let meta = token::erc20_meta(&self.rpc, token_address).await?;
            let amount = parse_token_amount(&args.amount, meta.decimals)?;
            let held = token::erc20_balance_of(&self.rpc, token_address, owner).await?;
            let tx = token::erc20_transfer_tx(token_address, destination, amount);
            (tx, amount, meta.symbol, meta.decimals, held)
        };

        if held < amount {
            return Err(anyhow!(
                "insufficient funds: balance {} {} is less than {}",
                format_token_amount(held, decimals),
                symbol,
                args.amount
            ));
        }

        let sent = transactions::send_evm_transaction(
            &self.rpc,
            &self.wallet,
            self.chain.chain_id,
            tx,
            &self.nonce_manager,
        )
        .await?;
        transactions::wait_for_receipt(&self.rpc, sent.tx_hash).await?;

        Ok(format!(
            "Successfully transferred {} {} to {}. Transaction hash: {:?}",
            format_token_amount(amount, decimals),
            symbol,
            to_checksum(&destination, None),
            sent.tx_hash
        ))
    }

    async fn smart_swap(&self, args: SmartSwapArgs) -> Result<String> {
        let asset_in = SwapAsset::parse(&args.token_in, &self.chain)?;
        let asset_out = SwapAsset::parse(&args.token_out, &self.chain)?;
        let outcome = swap::swap_exact_in(
            &self.rpc,
            &self.wallet,
            &self.chain,
            &self.nonce_manager,
            asset_in,
            asset_out,
            &args.amount,
        )
        .await?;
        transactions::wait_for_receipt(&self.rpc, outcome.tx.tx_hash).await?;

        Ok(format!(
            "Swapped {} {} for ~{} {} (minimum {}). Transaction hash: {:?}",
            outcome.amount_in,
            outcome.symbol_in,
            outcome.expected_out,
            outcome.symbol_out,
            outcome.min_out,
            outcome.tx.tx_hash
        ))
    }
}

#[async_trait]
impl WalletSdk for EvmWallet {
    fn chain_id(&self) -> u64 {
        self.chain.chain_id
    }

    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn run_action(&self, action: &str, args: Value) -> Result<Value> {
        let text = match action {
            actions::GET_ADDRESS => to_checksum(&self.wallet.address(), None),
            actions::GET_BALANCE => self.get_balance(serde_json::from_value(args)?).await?,
            actions::SMART_TRANSFER => self.smart_transfer(serde_json::from_value(args)?).await?,
            actions::SMART_SWAP => self.smart_swap(serde_json::from_value(args)?).await?,
            other => return Err(anyhow!("unknown wallet action '{}'", other)),
        };
        Ok(Value::String(text))
    }
}

/// Connector used in production: one [`EvmWallet`] per signing key.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvmConnector;

#[async_trait]
impl SdkConnector for EvmConnector {
    async fn connect(
        &self,
        signing_key: &SecretString,
        settings: &WalletSettings,
    ) -> Result<Arc<dyn WalletSdk>> {
        let wallet = EvmWallet::connect(signing_key, settings).await?;
        Ok(Arc::new(wallet))
    }
}
