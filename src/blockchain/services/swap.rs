//! Token swaps through a Uniswap-V2-compatible router.

use anyhow::{anyhow, Context, Result};
use ethers_core::abi::{decode, ParamType, Token};
use ethers_core::types::{Address, TransactionRequest, U256};
use ethers_signers::{LocalWallet, Signer};
use tracing::info;

use crate::blockchain::{
    chains::{self, ChainInfo},
    client::RpcClient,
    models::TransactionResponse,
    nonce_manager::NonceManager,
    services::{
        balance,
        token::{self, encode_call, eth_call},
        transactions,
    },
    units::{format_token_amount, parse_token_amount},
};

/// Minimum output is the quote minus this many basis points.
const SLIPPAGE_BPS: u64 = 100;
const DEADLINE_SECS: i64 = 20 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAsset {
    Native,
    Token(Address),
}

impl SwapAsset {
    /// Zero address or the chain's native symbol mean the native currency.
    pub fn parse(input: &str, chain: &ChainInfo) -> Result<Self> {
        if chains::is_native_sentinel(input) || input.trim().eq_ignore_ascii_case(chain.native_symbol) {
            return Ok(SwapAsset::Native);
        }
        Ok(SwapAsset::Token(token::parse_address(input)?))
    }
}

#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub tx: TransactionResponse,
    pub amount_in: String,
    pub symbol_in: String,
    pub expected_out: String,
    pub min_out: String,
    pub symbol_out: String,
}

struct AssetMeta {
    symbol: String,
    decimals: u32,
}

async fn asset_meta(rpc: &RpcClient, chain: &ChainInfo, asset: SwapAsset) -> Result<AssetMeta> {
    match asset {
        SwapAsset::Native => Ok(AssetMeta {
            symbol: chain.native_symbol.to_uppercase(),
            decimals: chain.native_decimals,
        }),
        SwapAsset::Token(address) => {
            let meta = token::erc20_meta(rpc, address).await?;
            Ok(AssetMeta {
                symbol: meta.symbol,
                decimals: meta.decimals,
            })
        }
    }
}

async fn router_weth(rpc: &RpcClient, router: Address) -> Result<Address> {
    let raw = eth_call(rpc, router, encode_call("WETH()", vec![])).await?;
    let bytes = hex::decode(raw.as_str().unwrap_or("0x").trim_start_matches("0x"))?;
    match decode(&[ParamType::Address], &bytes)?.first() {
        Some(Token::Address(a)) => Ok(*a),
        _ => Err(anyhow!("router {:?} returned a malformed WETH() result", router)),
    }
}

async fn amounts_out(rpc: &RpcClient, router: Address, amount_in: U256, path: &[Address]) -> Result<U256> {
    let data = encode_call(
        "getAmountsOut(uint256,address[])",
        vec![
            Token::Uint(amount_in),
            Token::Array(path.iter().map(|a| Token::Address(*a)).collect()),
        ],
    );
    let raw = eth_call(rpc, router, data).await?;
    let bytes = hex::decode(raw.as_str().unwrap_or("0x").trim_start_matches("0x"))?;
    let tokens = decode(&[ParamType::Array(Box::new(ParamType::Uint(256)))], &bytes)?;
    match tokens.first() {
        Some(Token::Array(amounts)) => match amounts.last() {
            Some(Token::Uint(out)) => Ok(*out),
            _ => Err(anyhow!("empty getAmountsOut() result")),
        },
        _ => Err(anyhow!("malformed getAmountsOut() result")),
    }
}

/// Picks the direct pair when the router can quote it, otherwise routes via WETH.
async fn best_path(
    rpc: &RpcClient,
    router: Address,
    weth: Address,
    from: Address,
    to: Address,
    amount_in: U256,
) -> Result<(Vec<Address>, U256)> {
    let direct = vec![from, to];
    match amounts_out(rpc, router, amount_in, &direct).await {
        Ok(out) if !out.is_zero() => return Ok((direct, out)),
        _ if from == weth || to == weth => {
            return Err(anyhow!("no liquidity for {:?} -> {:?}", from, to));
        }
        _ => {}
    }
    let hop = vec![from, weth, to];
    let out = amounts_out(rpc, router, amount_in, &hop)
        .await
        .with_context(|| format!("no route for {:?} -> {:?}", from, to))?;
    Ok((hop, out))
}

fn path_token(path: &[Address]) -> Token {
    Token::Array(path.iter().map(|a| Token::Address(*a)).collect())
}

/// Swaps an exact `amount` of `asset_in` for as much `asset_out` as the router gives.
pub async fn swap_exact_in(
    rpc: &RpcClient,
    wallet: &LocalWallet,
    chain: &ChainInfo,
    nonce_manager: &NonceManager,
    asset_in: SwapAsset,
    asset_out: SwapAsset,
    amount: &str,
) -> Result<SwapOutcome> {
    let router = chain
        .v2_router
        .ok_or_else(|| anyhow!("swaps are not supported on chain {} ({})", chain.chain_id, chain.name))?
        .parse::<Address>()?;
    if asset_in == asset_out {
        return Err(anyhow!("source and destination tokens are the same"));
    }

    let owner = wallet.address();
    let meta_in = asset_meta(rpc, chain, asset_in).await?;
    let meta_out = asset_meta(rpc, chain, asset_out).await?;
    let amount_in = parse_token_amount(amount, meta_in.decimals)?;

    let held = match asset_in {
        SwapAsset::Native => balance::native_balance(rpc, owner).await?,
        SwapAsset::Token(t) => token::erc20_balance_of(rpc, t, owner).await?,
    };
    if held < amount_in {
        return Err(anyhow!(
            "insufficient funds: balance {} {} is less than {}",
            format_token_amount(held, meta_in.decimals),
            meta_in.symbol,
            amount
        ));
    }

    let weth = router_weth(rpc, router).await?;
    let from = match asset_in {
        SwapAsset::Native => weth,
        SwapAsset::Token(t) => t,
    };
    let to = match asset_out {
        SwapAsset::Native => weth,
        SwapAsset::Token(t) => t,
    };
    let (path, quoted) = best_path(rpc, router, weth, from, to, amount_in).await?;
    let min_out = quoted * U256::from(10_000 - SLIPPAGE_BPS) / U256::from(10_000u64);
    let deadline = U256::from((chrono::Utc::now().timestamp() + DEADLINE_SECS) as u64);

    if let SwapAsset::Token(t) = asset_in {
        let allowance = token::erc20_allowance(rpc, t, owner, router).await?;
        if allowance < amount_in {
            info!("Approving router {:?} to spend {} of {:?}", router, amount_in, t);
            let approval = transactions::send_evm_transaction(
                rpc,
                wallet,
                chain.chain_id,
                token::erc20_approve_tx(t, router, amount_in),
                nonce_manager,
            )
            .await
            .context("router approval failed")?;
            transactions::wait_for_receipt(rpc, approval.tx_hash).await?;
        }
    }

    let tx = match (asset_in, asset_out) {
        (SwapAsset::Native, _) => TransactionRequest::new()
            .to(router)
            .value(amount_in)
            .data(encode_call(
                "swapExactETHForTokens(uint256,address[],address,uint256)",
                vec![Token::Uint(min_out), path_token(&path), Token::Address(owner), Token::Uint(deadline)],
            )),
        (_, SwapAsset::Native) => TransactionRequest::new().to(router).data(encode_call(
            "swapExactTokensForETH(uint256,uint256,address[],address,uint256)",
            vec![
                Token::Uint(amount_in),
                Token::Uint(min_out),
                path_token(&path),
                Token::Address(owner),
                Token::Uint(deadline),
            ],
        )),
        _ => TransactionRequest::new().to(router).data(encode_call(
            "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
            vec![
                Token::Uint(amount_in),
                Token::Uint(min_out),
                path_token(&path),
                Token::Address(owner),
                Token::Uint(deadline),
            ],
        )),
    };

    let tx = transactions::send_evm_transaction(rpc, wallet, chain.chain_id, tx, nonce_manager).await?;

    Ok(SwapOutcome {
        tx,
        amount_in: format_token_amount(amount_in, meta_in.decimals),
        symbol_in: meta_in.symbol,
        expected_out: format_token_amount(quoted, meta_out.decimals),
        min_out: format_token_amount(min_out, meta_out.decimals),
        symbol_out: meta_out.symbol,
    })
}
