// src/blockchain/nonce_manager.rs

use std::sync::Arc;

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use serde_json::json;
use tokio::sync::Mutex;

use crate::blockchain::client::RpcClient;

// Manages nonces for multiple sender addresses to prevent race conditions.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // Each address gets its own state, protected by a Mutex.
    // The DashMap allows for concurrent access to different address states.
    nonces: Arc<DashMap<Address, Arc<Mutex<NonceState>>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<U256>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the next valid nonce for a given address.
    /// The first call per address reads the pending transaction count from the node;
    /// later calls hand out sequential values without a round trip.
    pub async fn get_next_nonce(&self, address: Address, rpc: &RpcClient) -> anyhow::Result<U256> {
        let address_nonce_lock = self
            .nonces
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone();

        let mut state = address_nonce_lock.lock().await;

        let nonce_to_use = match state.next_nonce {
            Some(nonce) => nonce,
            None => {
                rpc.call_quantity(
                    "eth_getTransactionCount",
                    json!([format!("{:?}", address), "pending"]),
                )
                .await?
            }
        };

        state.next_nonce = Some(nonce_to_use + U256::one());

        Ok(nonce_to_use)
    }

    /// Forgets the cached nonce so the next transaction re-reads it from the node.
    /// Called after a send fails, since the reserved nonce was never consumed.
    /// The per-address lock is kept, so callers already waiting on it see the reset.
    pub async fn reset(&self, address: Address) {
        let state = self.nonces.get(&address).map(|entry| entry.value().clone());
        if let Some(state) = state {
            state.lock().await.next_nonce = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use url::Url;

    #[tokio::test]
    async fn fetches_once_then_increments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"method": "eth_getTransactionCount"}),
            ))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x7"}"#)
            .expect(1)
            .create_async()
            .await;
        let rpc = RpcClient::new(Url::parse(&server.url()).unwrap(), SecretString::new("k".into()));
        let manager = NonceManager::new();
        let address = Address::repeat_byte(0x11);

        assert_eq!(manager.get_next_nonce(address, &rpc).await.unwrap(), U256::from(7));
        assert_eq!(manager.get_next_nonce(address, &rpc).await.unwrap(), U256::from(8));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reset_rereads_from_the_node_and_keeps_the_lock() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"method": "eth_getTransactionCount"}),
            ))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x3"}"#)
            .expect(2)
            .create_async()
            .await;
        let rpc = RpcClient::new(Url::parse(&server.url()).unwrap(), SecretString::new("k".into()));
        let manager = NonceManager::new();
        let address = Address::repeat_byte(0x22);

        assert_eq!(manager.get_next_nonce(address, &rpc).await.unwrap(), U256::from(3));
        let lock_before = manager.nonces.get(&address).unwrap().value().clone();
        manager.reset(address).await;
        let lock_after = manager.nonces.get(&address).unwrap().value().clone();
        assert!(Arc::ptr_eq(&lock_before, &lock_after));

        assert_eq!(manager.get_next_nonce(address, &rpc).await.unwrap(), U256::from(3));
        mock.assert_async().await;
    }
}
