// src/blockchain/services/transactions.rs

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use ethers_core::types::{TransactionRequest, H256};
use ethers_signers::{LocalWallet, Signer};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::blockchain::{client::RpcClient, models::TransactionResponse, nonce_manager::NonceManager};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_MAX_POLLS: u32 = 90;

/// A centralized function for sending any EVM transaction from the session wallet.
/// It uses the NonceManager to prevent nonce races between concurrent tool calls.
pub async fn send_evm_transaction(
    rpc: &RpcClient,
    wallet: &LocalWallet,
    chain_id: u64,
    tx_request: TransactionRequest,
    nonce_manager: &NonceManager,
) -> Result<TransactionResponse> {
    let from_address = wallet.address();
    let nonce = nonce_manager.get_next_nonce(from_address, rpc).await?;

    let result = sign_and_send(rpc, wallet, chain_id, tx_request, nonce).await;
    if result.is_err() {
        // The reserved nonce was never used on-chain.
        nonce_manager.reset(from_address).await;
    }
    result
}

async fn sign_and_send(
    rpc: &RpcClient,
    wallet: &LocalWallet,
    chain_id: u64,
    tx_request: TransactionRequest,
    nonce: ethers_core::types::U256,
) -> Result<TransactionResponse> {
    let mut tx = tx_request
        .from(wallet.address())
        .nonce(nonce)
        .chain_id(chain_id);

    // If gas is not provided, estimate it via eth_estimateGas
    if tx.gas.is_none() {
        let call_obj = serde_json::to_value(&tx)?;
        let gas = rpc
            .call_quantity("eth_estimateGas", json!([call_obj]))
            .await
            .context("gas estimation failed")?;
        tx = tx.gas(gas);
    }

    // If gas price not provided, fetch eth_gasPrice and use legacy gas_price
    if tx.gas_price.is_none() {
        let gas_price = rpc.call_quantity("eth_gasPrice", json!([])).await?;
        tx = tx.gas_price(gas_price);
    }

    let signature = wallet.sign_transaction(&tx.clone().into()).await?;
    let raw_tx = tx.rlp_signed(&signature);

    let result = rpc
        .call("eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw_tx))]))
        .await?;
    let tx_hash = result
        .as_str()
        .ok_or_else(|| anyhow!("Failed to extract transaction hash from response"))?
        .parse::<H256>()
        .map_err(|e| anyhow!("Malformed transaction hash: {}", e))?;

    info!("Submitted transaction {:?} (nonce {})", tx_hash, nonce);
    Ok(TransactionResponse { tx_hash })
}

/// Polls for the receipt of `tx_hash` and fails if the transaction reverted.
pub async fn wait_for_receipt(rpc: &RpcClient, tx_hash: H256) -> Result<Value> {
    for attempt in 1..=RECEIPT_MAX_POLLS {
        let receipt = rpc
            .call("eth_getTransactionReceipt", json!([format!("{:?}", tx_hash)]))
            .await?;
        if receipt.is_null() {
            debug!("Receipt for {:?} not yet available (attempt {})", tx_hash, attempt);
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
            continue;
        }
        return match receipt.get("status").and_then(Value::as_str) {
            Some("0x1") => Ok(receipt),
            Some(status) => Err(anyhow!("transaction {:?} reverted (status {})", tx_hash, status)),
            None => {
                warn!("Receipt for {:?} has no status field", tx_hash);
                Ok(receipt)
            }
        };
    }
    Err(anyhow!(
        "transaction {:?} was not mined after {} polls",
        tx_hash,
        RECEIPT_MAX_POLLS
    ))
}
