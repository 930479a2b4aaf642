// src/blockchain/models.rs
use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Balance of one asset held by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub symbol: String,
    /// `None` for the chain's native currency.
    pub token: Option<Address>,
    pub raw: U256,
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub tx_hash: H256,
}

// --- SDK action arguments (camelCase, as the wallet SDK names them) ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetBalanceArgs {
    #[serde(default)]
    pub token_addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SmartTransferArgs {
    pub amount: String,
    pub destination: String,
    /// Token contract, or the chain's native symbol (e.g. `bnb`).
    pub token_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SmartSwapArgs {
    pub token_in: String,
    pub token_out: String,
    pub amount: String,
}

/// Renders balances the way the SDK reports them to the caller.
pub fn render_balances(balances: &[TokenBalance]) -> String {
    if balances.is_empty() {
        return "No balances found".to_string();
    }
    let lines: Vec<String> = balances
        .iter()
        .map(|b| format!("{}: {}", b.symbol, b.formatted))
        .collect();
    format!("Balances:\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sdk_args_use_camel_case() {
        let args: SmartTransferArgs = serde_json::from_value(json!({
            "amount": "1",
            "destination": "0xabc",
            "tokenAddress": "bnb"
        }))
        .unwrap();
        assert_eq!(args.token_address, "bnb");

        let empty: GetBalanceArgs = serde_json::from_value(json!({})).unwrap();
        assert!(empty.token_addresses.is_empty());
    }

    #[test]
    fn renders_balance_lines() {
        let text = render_balances(&[TokenBalance {
            symbol: "BNB".into(),
            token: None,
            raw: U256::from(5u64),
            formatted: "0.5".into(),
        }]);
        assert_eq!(text, "Balances:\nBNB: 0.5");
    }
}
