//! Tool name → wallet SDK action table, with one argument converter per tool.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use validator::Validate;

use crate::blockchain::{chains, sdk::actions};
use crate::mcp::tools;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("no mapping for tool '{0}'")]
    NoMapping(String),
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

/// Facts about the active session that some conversions depend on.
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext {
    pub chain_id: u64,
}

pub type ArgumentConverter = fn(&Map<String, Value>, &ConversionContext) -> Result<Value, ToolError>;

#[derive(Debug)]
pub struct ActionMapping {
    pub tool: &'static str,
    pub sdk_action: &'static str,
    pub convert: ArgumentConverter,
}

static MAPPINGS: &[ActionMapping] = &[
    ActionMapping {
        tool: tools::GET_ADDRESS,
        sdk_action: actions::GET_ADDRESS,
        convert: convert_get_address,
    },
    ActionMapping {
        tool: tools::GET_BALANCE,
        sdk_action: actions::GET_BALANCE,
        convert: convert_get_balance,
    },
    ActionMapping {
        tool: tools::TRANSFER_TOKEN,
        sdk_action: actions::SMART_TRANSFER,
        convert: convert_transfer,
    },
    ActionMapping {
        tool: tools::SWAP_TOKENS,
        sdk_action: actions::SMART_SWAP,
        convert: convert_swap,
    },
    ActionMapping {
        tool: tools::BUY_OPENROUTER_CREDITS,
        sdk_action: actions::BUY_OPENROUTER_CREDITS,
        convert: convert_buy_credits,
    },
];

pub fn lookup(tool: &str) -> Option<&'static ActionMapping> {
    MAPPINGS.iter().find(|m| m.tool == tool)
}

pub fn mappings() -> &'static [ActionMapping] {
    MAPPINGS
}

/// Finds the mapping for `tool` and converts `args` into SDK-shaped arguments.
pub fn convert(
    tool: &str,
    args: &Map<String, Value>,
    ctx: &ConversionContext,
) -> Result<(&'static ActionMapping, Value), ToolError> {
    let mapping = lookup(tool).ok_or_else(|| ToolError::NoMapping(tool.to_string()))?;
    let converted = (mapping.convert)(args, ctx)?;
    Ok((mapping, converted))
}

fn optional_str(args: &Map<String, Value>, key: &'static str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        // Callers sometimes send amounts as JSON numbers
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(ToolError::InvalidArgument {
            name: key,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

fn required_str(args: &Map<String, Value>, key: &'static str) -> Result<String, ToolError> {
    optional_str(args, key)?.ok_or(ToolError::MissingArgument(key))
}

fn convert_get_address(_args: &Map<String, Value>, _ctx: &ConversionContext) -> Result<Value, ToolError> {
    Ok(json!({}))
}

fn convert_get_balance(args: &Map<String, Value>, _ctx: &ConversionContext) -> Result<Value, ToolError> {
    let token_addresses: Vec<String> = match optional_str(args, "address")? {
        Some(address) if !chains::is_native_sentinel(&address) => vec![address],
        _ => Vec::new(),
    };
    Ok(json!({ "tokenAddresses": token_addresses }))
}

fn convert_transfer(args: &Map<String, Value>, ctx: &ConversionContext) -> Result<Value, ToolError> {
    let destination = required_str(args, "to")?;
    let token = required_str(args, "address")?;
    let amount = required_str(args, "amount")?;
    let token_address = if chains::is_native_sentinel(&token) {
        chains::native_symbol(ctx.chain_id).to_string()
    } else {
        token
    };
    Ok(json!({
        "amount": amount,
        "destination": destination,
        "tokenAddress": token_address,
    }))
}

fn convert_swap(args: &Map<String, Value>, _ctx: &ConversionContext) -> Result<Value, ToolError> {
    Ok(json!({
        "tokenIn": required_str(args, "fromToken")?,
        "tokenOut": required_str(args, "toToken")?,
        "amount": required_str(args, "amount")?,
    }))
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BuyCreditsArgs {
    #[validate(range(min = 1.0, max = 1000.0))]
    pub amount_usd: f64,
}

fn convert_buy_credits(args: &Map<String, Value>, _ctx: &ConversionContext) -> Result<Value, ToolError> {
    let amount_usd = match args.get("amountUsd") {
        None | Some(Value::Null) => return Err(ToolError::MissingArgument("amountUsd")),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| ToolError::InvalidArgument {
        name: "amountUsd",
        reason: "expected a number".into(),
    })?;

    let parsed = BuyCreditsArgs { amount_usd };
    parsed.validate().map_err(|_| ToolError::InvalidArgument {
        name: "amountUsd",
        reason: format!(
            "must be between {} and {} USD, got {}",
            tools::MIN_CREDIT_USD,
            tools::MAX_CREDIT_USD,
            amount_usd
        ),
    })?;
    Ok(json!({ "amountUsd": parsed.amount_usd }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::catalog;

    const BSC: ConversionContext = ConversionContext { chain_id: 56 };

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn every_mapping_is_in_the_catalog_exactly_once() {
        for m in mappings() {
            let hits = catalog().iter().filter(|t| t.name == m.tool).count();
            assert_eq!(hits, 1, "{}", m.tool);
        }
        for tool in catalog() {
            assert!(lookup(tool.name).is_some(), "{} has no mapping", tool.name);
        }
    }

    #[test]
    fn zero_address_balance_is_a_native_query() {
        let (m, converted) = convert(
            tools::GET_BALANCE,
            &args(json!({"address": chains::NATIVE_SENTINEL})),
            &BSC,
        )
        .unwrap();
        assert_eq!(m.sdk_action, actions::GET_BALANCE);
        assert_eq!(converted, json!({"tokenAddresses": []}));

        let (_, converted) = convert(tools::GET_BALANCE, &Map::new(), &BSC).unwrap();
        assert_eq!(converted, json!({"tokenAddresses": []}));
    }

    #[test]
    fn token_balance_is_a_single_filter() {
        let usdt = "0x55d398326f99059fF775485246999027B3197955";
        let (_, converted) = convert(tools::GET_BALANCE, &args(json!({"address": usdt})), &BSC).unwrap();
        assert_eq!(converted, json!({"tokenAddresses": [usdt]}));
    }

    #[test]
    fn native_transfer_uses_chain_symbol() {
        let to = "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1";
        let (m, converted) = convert(
            tools::TRANSFER_TOKEN,
            &args(json!({"to": to, "address": chains::NATIVE_SENTINEL, "amount": "0.1"})),
            &BSC,
        )
        .unwrap();
        assert_eq!(m.sdk_action, actions::SMART_TRANSFER);
        assert_eq!(
            converted,
            json!({"amount": "0.1", "destination": to, "tokenAddress": "bnb"})
        );

        let (_, on_base) = convert(
            tools::TRANSFER_TOKEN,
            &args(json!({"to": to, "address": chains::NATIVE_SENTINEL, "amount": 2})),
            &ConversionContext { chain_id: 8453 },
        )
        .unwrap();
        assert_eq!(on_base["tokenAddress"], "eth");
        assert_eq!(on_base["amount"], "2");
    }

    #[test]
    fn swap_renames_fields() {
        let (m, converted) = convert(
            tools::SWAP_TOKENS,
            &args(json!({"fromToken": "0xa", "toToken": "0xb", "amount": "5"})),
            &BSC,
        )
        .unwrap();
        assert_eq!(m.sdk_action, actions::SMART_SWAP);
        assert_eq!(converted, json!({"tokenIn": "0xa", "tokenOut": "0xb", "amount": "5"}));
    }

    #[test]
    fn missing_arguments_are_named() {
        let err = convert(tools::SWAP_TOKENS, &args(json!({"fromToken": "0xa"})), &BSC).unwrap_err();
        assert_eq!(err, ToolError::MissingArgument("toToken"));
    }

    #[test]
    fn unknown_tools_have_no_mapping() {
        let err = convert("bridge-tokens", &Map::new(), &BSC).unwrap_err();
        assert_eq!(err.to_string(), "no mapping for tool 'bridge-tokens'");
    }

    #[test]
    fn credit_amount_is_bounded() {
        for bad in [json!(0.5), json!(1000.01), json!(-3), json!("lots")] {
            let err = convert(tools::BUY_OPENROUTER_CREDITS, &args(json!({"amountUsd": bad})), &BSC)
                .unwrap_err();
            assert!(matches!(err, ToolError::InvalidArgument { name: "amountUsd", .. }));
        }
        for good in [json!(1), json!(1000), json!("25.5")] {
            assert!(convert(tools::BUY_OPENROUTER_CREDITS, &args(json!({"amountUsd": good})), &BSC).is_ok());
        }
        assert_eq!(
            convert(tools::BUY_OPENROUTER_CREDITS, &Map::new(), &BSC).unwrap_err(),
            ToolError::MissingArgument("amountUsd")
        );
    }
}
