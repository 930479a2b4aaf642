use anyhow::Result;
use ethers_core::types::{Address, U256};
use serde_json::json;
use tracing::warn;

use crate::blockchain::{
    chains::ChainInfo,
    client::RpcClient,
    models::TokenBalance,
    services::token,
    units::format_token_amount,
};

pub async fn native_balance(rpc: &RpcClient, address: Address) -> Result<U256> {
    rpc.call_quantity("eth_getBalance", json!([format!("{:?}", address), "latest"]))
        .await
}

pub async fn native_token_balance(
    rpc: &RpcClient,
    chain: &ChainInfo,
    owner: Address,
) -> Result<TokenBalance> {
    let raw = native_balance(rpc, owner).await?;
    Ok(TokenBalance {
        symbol: chain.native_symbol.to_uppercase(),
        token: None,
        raw,
        formatted: format_token_amount(raw, chain.native_decimals),
    })
}

pub async fn erc20_token_balance(rpc: &RpcClient, token: Address, owner: Address) -> Result<TokenBalance> {
    let meta = token::erc20_meta(rpc, token).await?;
    let raw = token::erc20_balance_of(rpc, token, owner).await?;
    Ok(TokenBalance {
        symbol: meta.symbol,
        token: Some(token),
        raw,
        formatted: format_token_amount(raw, meta.decimals),
    })
}

/// Balances for a filter list; an empty list means the native currency.
/// A token that cannot be read fails the whole query when it is the only one,
/// otherwise it is skipped with a warning.
pub async fn get_balances(
    rpc: &RpcClient,
    chain: &ChainInfo,
    owner: Address,
    tokens: &[Address],
) -> Result<Vec<TokenBalance>> {
    if tokens.is_empty() {
        return Ok(vec![native_token_balance(rpc, chain, owner).await?]);
    }
    if let [only] = tokens {
        return Ok(vec![erc20_token_balance(rpc, *only, owner).await?]);
    }

    let mut balances = Vec::with_capacity(tokens.len());
    for token in tokens {
        match erc20_token_balance(rpc, *token, owner).await {
            Ok(b) => balances.push(b),
            Err(e) => warn!("Skipping balance of {:?}: {:#}", token, e),
        }
    }
    Ok(balances)
}
