// src/blockchain/services/token.rs

use anyhow::{anyhow, Context, Result};
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{Address, Bytes, TransactionRequest, U256};
use ethers_core::utils::keccak256;
use serde_json::{json, Value};

use crate::blockchain::client::RpcClient;

fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

fn hex_to_bytes(v: &Value) -> Result<Vec<u8>> {
    let s = v.as_str().ok_or_else(|| anyhow!("eth_call result not string"))?;
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(s)?)
}

fn decode_string(v: &Value) -> Option<String> {
    let bytes = hex_to_bytes(v).ok()?;
    // Try standard ABI string
    if let Ok(tokens) = decode(&[ParamType::String], &bytes) {
        if let Some(Token::String(s)) = tokens.first() {
            return Some(s.clone());
        }
    }
    // Fallback: bytes32 to string (strip zeros), as used by MKR and friends
    if let Ok(tokens) = decode(&[ParamType::FixedBytes(32)], &bytes) {
        if let Some(Token::FixedBytes(b)) = tokens.first() {
            return String::from_utf8(b.iter().copied().take_while(|c| *c != 0u8).collect()).ok();
        }
    }
    None
}

pub(crate) fn decode_u256(v: &Value) -> Option<U256> {
    let bytes = hex_to_bytes(v).ok()?;
    match decode(&[ParamType::Uint(256)], &bytes).ok()?.first() {
        Some(Token::Uint(n)) => Some(*n),
        _ => None,
    }
}

pub(crate) fn encode_call(sig: &str, tokens: Vec<Token>) -> Bytes {
    let mut out = selector(sig).to_vec();
    let mut tail = encode(&tokens);
    out.append(&mut tail);
    Bytes::from(out)
}

pub(crate) async fn eth_call(rpc: &RpcClient, to: Address, data: Bytes) -> Result<Value> {
    rpc.call(
        "eth_call",
        json!([{"to": format!("{:?}", to), "data": format!("0x{}", hex::encode(data))}, "latest"]),
    )
    .await
}

/// Parses a user-supplied address, producing an error the dispatcher can
/// classify as an invalid address.
pub fn parse_address(input: &str) -> Result<Address> {
    let trimmed = input.trim();
    if !trimmed.starts_with("0x") || trimmed.len() != 42 {
        return Err(anyhow!("invalid address '{}'", input));
    }
    trimmed
        .parse::<Address>()
        .map_err(|_| anyhow!("invalid address '{}'", input))
}

/// Metadata needed to display and scale amounts of an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Meta {
    pub symbol: String,
    pub decimals: u32,
}

pub async fn erc20_meta(rpc: &RpcClient, token: Address) -> Result<Erc20Meta> {
    let decimals_raw = eth_call(rpc, token, encode_call("decimals()", vec![]))
        .await
        .with_context(|| format!("failed to read decimals() of {:?}", token))?;
    let decimals = decode_u256(&decimals_raw)
        .ok_or_else(|| anyhow!("{:?} does not look like an ERC-20 token (no decimals)", token))?;
    // symbol() is optional in the standard; fall back to the address
    let symbol = eth_call(rpc, token, encode_call("symbol()", vec![]))
        .await
        .ok()
        .and_then(|raw| decode_string(&raw))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("{:?}", token));
    Ok(Erc20Meta {
        symbol,
        decimals: decimals.low_u32(),
    })
}

pub async fn erc20_balance_of(rpc: &RpcClient, token: Address, owner: Address) -> Result<U256> {
    let data = encode_call("balanceOf(address)", vec![Token::Address(owner)]);
    let raw = eth_call(rpc, token, data).await?;
    decode_u256(&raw).ok_or_else(|| anyhow!("malformed balanceOf() result from {:?}", token))
}

pub async fn erc20_allowance(
    rpc: &RpcClient,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    let data = encode_call(
        "allowance(address,address)",
        vec![Token::Address(owner), Token::Address(spender)],
    );
    let raw = eth_call(rpc, token, data).await?;
    decode_u256(&raw).ok_or_else(|| anyhow!("malformed allowance() result from {:?}", token))
}

pub fn erc20_transfer_tx(token: Address, to: Address, amount: U256) -> TransactionRequest {
    let data = encode_call("transfer(address,uint256)", vec![Token::Address(to), Token::Uint(amount)]);
    TransactionRequest::new().to(token).data(data)
}

pub fn erc20_approve_tx(token: Address, spender: Address, amount: U256) -> TransactionRequest {
    let data = encode_call(
        "approve(address,uint256)",
        vec![Token::Address(spender), Token::Uint(amount)],
    );
    TransactionRequest::new().to(token).data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_calldata_uses_erc20_selector() {
        let tx = erc20_transfer_tx(Address::repeat_byte(1), Address::repeat_byte(2), U256::from(5));
        let data = tx.data.unwrap();
        // transfer(address,uint256) = 0xa9059cbb
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32 * 2);
    }

    #[test]
    fn decodes_abi_and_bytes32_strings() {
        let abi = format!("0x{}", hex::encode(encode(&[Token::String("USDC".into())])));
        assert_eq!(decode_string(&json!(abi)).as_deref(), Some("USDC"));

        let mut raw = [0u8; 32];
        raw[..3].copy_from_slice(b"MKR");
        let b32 = format!("0x{}", hex::encode(raw));
        assert_eq!(decode_string(&json!(b32)).as_deref(), Some("MKR"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(parse_address("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d").is_ok());
        let err = parse_address("0x1234").unwrap_err();
        assert!(err.to_string().starts_with("invalid address"));
        assert!(parse_address("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d00").is_err());
    }
}
