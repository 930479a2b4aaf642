// src/blockchain/chains.rs

//! Static facts about the EVM networks the wallet knows how to operate on.

/// The all-zero address, used by tool callers to mean "the native currency".
pub const NATIVE_SENTINEL: &str = "0x0000000000000000000000000000000000000000";

/// Decimal precision of USDC on the chains listed below.
pub const USDC_DECIMALS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: &'static str,
    /// Lowercase symbol the wallet SDK accepts in place of a token address.
    pub native_symbol: &'static str,
    pub native_decimals: u32,
    /// USDC contract used for OpenRouter credit purchases.
    pub usdc: Option<&'static str>,
    /// Uniswap-V2-compatible router used for swaps.
    pub v2_router: Option<&'static str>,
}

const CHAINS: &[ChainInfo] = &[
    ChainInfo {
        chain_id: 1,
        name: "Ethereum",
        native_symbol: "eth",
        native_decimals: 18,
        usdc: Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        v2_router: Some("0x7a250d5630B4cF539739dF2C5dAcCe4E14F2488D"),
    },
    ChainInfo {
        chain_id: 56,
        name: "BNB Smart Chain",
        native_symbol: "bnb",
        native_decimals: 18,
        usdc: None,
        v2_router: Some("0x10ED43C718714eb63d5aA57B78B54704E256024E"),
    },
    ChainInfo {
        chain_id: 137,
        name: "Polygon",
        native_symbol: "pol",
        native_decimals: 18,
        usdc: Some("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359"),
        v2_router: Some("0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff"),
    },
    ChainInfo {
        chain_id: 8453,
        name: "Base",
        native_symbol: "eth",
        native_decimals: 18,
        usdc: Some("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        v2_router: Some("0x4752ba5DBc23f44D87826276BF6Fd6b1C372aD24"),
    },
    ChainInfo {
        chain_id: 43114,
        name: "Avalanche C-Chain",
        native_symbol: "avax",
        native_decimals: 18,
        usdc: None,
        v2_router: Some("0x60aE616a2155Ee3d9A68541Ba4544862310933d4"),
    },
];

pub fn lookup(chain_id: u64) -> Option<&'static ChainInfo> {
    CHAINS.iter().find(|c| c.chain_id == chain_id)
}

/// Native symbol for a chain, falling back to `eth` for unknown EVM networks.
pub fn native_symbol(chain_id: u64) -> &'static str {
    lookup(chain_id).map(|c| c.native_symbol).unwrap_or("eth")
}

pub fn usdc_address(chain_id: u64) -> Option<&'static str> {
    lookup(chain_id).and_then(|c| c.usdc)
}

/// True for the zero address sentinel (any letter case, with or without `0x`).
pub fn is_native_sentinel(address: &str) -> bool {
    let hex = address.trim().trim_start_matches("0x").trim_start_matches("0X");
    hex.len() == 40 && hex.chars().all(|c| c == '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_detection() {
        assert!(is_native_sentinel(NATIVE_SENTINEL));
        assert!(is_native_sentinel(" 0x0000000000000000000000000000000000000000 "));
        assert!(!is_native_sentinel("0x0"));
        assert!(!is_native_sentinel("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"));
    }

    #[test]
    fn usdc_only_on_credit_chains() {
        assert!(usdc_address(8453).is_some());
        assert!(usdc_address(56).is_none());
        assert!(usdc_address(999_999).is_none());
        assert_eq!(native_symbol(56), "bnb");
        assert_eq!(native_symbol(999_999), "eth");
    }
}
