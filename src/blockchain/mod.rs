// src/blockchain/mod.rs

pub mod chains;
pub mod client;
pub mod evm_client;
pub mod models;
pub mod nonce_manager;
pub mod sdk;
pub mod services;
#[cfg(test)]
pub(crate) mod test_support;
pub mod units;

pub use client::RpcClient;
pub use evm_client::{EvmConnector, EvmWallet};
pub use sdk::{SdkConnector, WalletSdk, WalletSettings};
