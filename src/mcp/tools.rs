//! The fixed tool catalog served on `tools/list`.

use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{json, Value};

use crate::blockchain::chains::NATIVE_SENTINEL;

pub const GET_ADDRESS: &str = "get-address";
pub const GET_BALANCE: &str = "get-balance";
pub const TRANSFER_TOKEN: &str = "transfer-token";
pub const SWAP_TOKENS: &str = "swap-tokens";
pub const BUY_OPENROUTER_CREDITS: &str = "buy-openrouter-credits";

pub const MIN_CREDIT_USD: f64 = 1.0;
pub const MAX_CREDIT_USD: f64 = 1000.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

lazy_static! {
    static ref CATALOG: Vec<ToolDefinition> = vec![
        ToolDefinition {
            name: GET_ADDRESS,
            description: "Gets the wallet address",
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolDefinition {
            name: GET_BALANCE,
            description: "Gets the wallet balance of a token, or of the native currency",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "address": {
                        "type": "string",
                        "description": format!(
                            "Token contract address (use {} or omit for the native currency)",
                            NATIVE_SENTINEL
                        )
                    }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: TRANSFER_TOKEN,
            description: "Transfer tokens to another address",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "to": {"type": "string", "description": "Recipient address"},
                    "address": {
                        "type": "string",
                        "description": format!(
                            "Token contract address (use {} for the native currency)",
                            NATIVE_SENTINEL
                        )
                    },
                    "amount": {"type": "string", "description": "Amount to transfer, in whole tokens (e.g. '1.5')"}
                },
                "required": ["to", "address", "amount"]
            }),
        },
        ToolDefinition {
            name: SWAP_TOKENS,
            description: "Swap one token for another",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "fromToken": {"type": "string", "description": "Source token address"},
                    "toToken": {"type": "string", "description": "Destination token address"},
                    "amount": {"type": "string", "description": "Amount of the source token to swap"}
                },
                "required": ["fromToken", "toToken", "amount"]
            }),
        },
        ToolDefinition {
            name: BUY_OPENROUTER_CREDITS,
            description: "Quote a purchase of OpenRouter credits paid in USDC from the wallet. \
                          Returns the payment intent; the on-chain payment is not submitted.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "amountUsd": {
                        "type": "number",
                        "minimum": MIN_CREDIT_USD,
                        "maximum": MAX_CREDIT_USD,
                        "description": "Amount of credits to buy, in USD"
                    }
                },
                "required": ["amountUsd"]
            }),
        },
    ];
}

pub fn catalog() -> &'static [ToolDefinition] {
    &CATALOG
}

pub fn find(name: &str) -> Option<&'static ToolDefinition> {
    CATALOG.iter().find(|t| t.name == name)
}

/// Body of a `tools/list` response.
pub fn list_tools_result() -> Value {
    json!({ "tools": catalog() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = catalog().iter().map(|t| t.name).collect();
        assert_eq!(names.len(), catalog().len());
    }

    #[test]
    fn schemas_are_objects_with_required_lists() {
        for tool in catalog() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["required"].is_array(), "{}", tool.name);
        }
    }

    #[test]
    fn serializes_with_input_schema_key() {
        let listed = list_tools_result();
        assert_eq!(listed["tools"][0]["name"], GET_ADDRESS);
        assert!(listed["tools"][0].get("inputSchema").is_some());
        assert_eq!(
            find(BUY_OPENROUTER_CREDITS).unwrap().input_schema["properties"]["amountUsd"]["maximum"],
            1000.0
        );
    }
}
