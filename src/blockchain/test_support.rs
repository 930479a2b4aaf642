// src/blockchain/test_support.rs

//! A scripted JSON-RPC node on mockito, routed per `method`, for exercising
//! the signing and sending paths.

use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, Bytes, H256};
use ethers_signers::{LocalWallet, Signer};
use mockito::{Matcher, Mock, ServerGuard};
use secrecy::SecretString;
use serde_json::{json, Value};
use url::Url;

use crate::blockchain::{client::RpcClient, services::token::encode_call};

// Well-known development key, address 0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1
pub(crate) const KEY: &str = "0x4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";

pub(crate) fn wallet(chain_id: u64) -> LocalWallet {
    LocalWallet::from_bytes(&hex::decode(KEY.trim_start_matches("0x")).unwrap())
        .unwrap()
        .with_chain_id(chain_id)
}

pub(crate) fn rpc(server: &ServerGuard) -> RpcClient {
    RpcClient::new(Url::parse(&server.url()).unwrap(), SecretString::new("sdk-key".into()))
}

/// ABI words for `tokens`, hex without prefix.
pub(crate) fn words(tokens: &[Token]) -> String {
    hex::encode(encode(tokens))
}

/// An `eth_call` result holding `tokens`.
pub(crate) fn abi_result(tokens: &[Token]) -> Value {
    json!(format!("0x{}", words(tokens)))
}

pub(crate) fn rpc_error(message: &str) -> String {
    json!({"jsonrpc": "2.0", "id": 1, "error": {"code": 3, "message": message}}).to_string()
}

fn rpc_result(result: Value) -> String {
    json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string()
}

/// Answers every request for `method` with `result`.
pub(crate) fn on_method(server: &mut ServerGuard, method: &str, result: Value) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(result))
}

/// Answers `eth_call` to `to` whose calldata is exactly `data`.
pub(crate) fn on_call(server: &mut ServerGuard, to: Address, data: Bytes, result: Value) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"method": "eth_call"})),
            Matcher::Regex(format!(r#""to":"{:?}""#, to)),
            Matcher::Regex(format!(r#""data":"0x{}""#, hex::encode(&data))),
        ]))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(result))
}

/// Accepts a raw transaction whose hex contains `pattern` and returns `hash`.
pub(crate) fn on_send(server: &mut ServerGuard, pattern: &str, hash: H256) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({"method": "eth_sendRawTransaction"})),
            Matcher::Regex(pattern.to_string()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!(format!("{:?}", hash))))
}

/// `decimals()` and `symbol()` of an ERC-20 token.
pub(crate) async fn erc20_meta(
    server: &mut ServerGuard,
    token: Address,
    symbol: &str,
    decimals: u64,
) -> Vec<Mock> {
    vec![
        on_call(server, token, encode_call("decimals()", vec![]), abi_result(&[Token::Uint(decimals.into())]))
            .create_async()
            .await,
        on_call(server, token, encode_call("symbol()", vec![]), abi_result(&[Token::String(symbol.into())]))
            .create_async()
            .await,
    ]
}

/// Gas estimate and legacy gas price for any transaction.
pub(crate) async fn gas(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        on_method(server, "eth_estimateGas", json!("0x30d40")).create_async().await,
        on_method(server, "eth_gasPrice", json!("0x3b9aca00")).create_async().await,
    ]
}
