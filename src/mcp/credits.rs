//! OpenRouter credit purchases paid in USDC.
//!
//! The flow stops at the quote: it asks OpenRouter for a Coinbase charge and
//! reports what paying it would take. No approval or payment transaction is
//! signed or broadcast.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use ethers_core::types::U256;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::blockchain::chains::{self, USDC_DECIMALS};
use crate::blockchain::sdk::actions;
use crate::blockchain::services::openrouter::{CoinbaseCharge, OpenRouterClient};
use crate::blockchain::units::format_token_amount;
use crate::mcp::session::WalletSession;

pub async fn buy_credits(
    session: &WalletSession,
    client: Option<&OpenRouterClient>,
    amount_usd: f64,
) -> Result<String> {
    let client = client.ok_or_else(|| {
        anyhow!("OpenRouter credits are not configured: set OPENROUTER_API_KEY to enable purchases")
    })?;

    let chain_id = session.chain_id;
    let usdc = chains::usdc_address(chain_id).ok_or_else(|| {
        anyhow!(
            "unsupported chain {} for OpenRouter credits: no USDC contract is known",
            chain_id
        )
    })?;

    let balance = match current_usdc_balance(session, usdc).await {
        Ok(b) => Some(b),
        Err(e) => {
            warn!("Could not read USDC balance before buying credits: {:#}", e);
            None
        }
    };

    let charge = client
        .create_coinbase_charge(amount_usd, session.address, chain_id)
        .await
        .context("failed to create OpenRouter charge")?;
    let total = charge.web3_data.transfer_intent.call_data.total_amount()?;
    info!(
        "OpenRouter charge {} needs {} USDC units on chain {}",
        charge.id, total, chain_id
    );

    Ok(render_quote(amount_usd, chain_id, &charge, total, balance.as_deref()))
}

async fn current_usdc_balance(session: &WalletSession, usdc: &str) -> Result<String> {
    let value = session
        .sdk
        .run_action(actions::GET_BALANCE, json!({ "tokenAddresses": [usdc] }))
        .await?;
    let text = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    Ok(text.trim_start_matches("Balances:").trim().to_string())
}

fn render_deadline(raw: &str) -> String {
    if let Ok(secs) = raw.trim().parse::<i64>() {
        if let Some(ts) = DateTime::<Utc>::from_timestamp(secs, 0) {
            return ts.to_rfc3339();
        }
    }
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => ts.with_timezone(&Utc).to_rfc3339(),
        Err(_) => raw.to_string(),
    }
}

fn render_quote(
    amount_usd: f64,
    chain_id: u64,
    charge: &CoinbaseCharge,
    total: U256,
    balance: Option<&str>,
) -> String {
    let intent = &charge.web3_data.transfer_intent;
    let call = &intent.call_data;
    let mut lines = vec![
        "OpenRouter credit purchase prepared".to_string(),
        format!("Requested credits: ${}", amount_usd),
        format!("USDC required: {}", format_token_amount(total, USDC_DECIMALS)),
        format!("Chain ID: {}", chain_id),
        format!("Intent ID: {}", charge.id),
        format!("Settlement contract: {}", intent.metadata.contract_address),
        format!("Recipient: {}", call.recipient),
        format!("Recipient amount: {}", call.recipient_amount),
        format!("Fee amount: {}", call.fee_amount),
        format!("Deadline: {}", render_deadline(&call.deadline)),
    ];
    if let Some(sender) = &intent.metadata.sender {
        lines.push(format!("Sender: {}", sender));
    }
    if let Some(balance) = balance {
        lines.push(format!("Current USDC balance: {}", balance));
    }
    lines.push(String::new());
    lines.push(
        "Note: no approval or payment transaction was submitted. Pay the intent above \
         through the settlement contract to receive the credits."
            .to_string(),
    );
    lines.join("\n")
}
