// src/mcp/session.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use ethers_core::types::Address;
use secrecy::SecretString;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::blockchain::{SdkConnector, WalletSdk, WalletSettings};
use crate::config::key_fingerprint;

/// A connected wallet client, shared by every tool call made with the same key.
pub struct WalletSession {
    pub fingerprint: String,
    pub sdk: Arc<dyn WalletSdk>,
    pub chain_id: u64,
    pub address: Address,
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("fingerprint", &self.fingerprint)
            .field("chain_id", &self.chain_id)
            .field("address", &self.address)
            .finish()
    }
}

/// Wallet sessions keyed by signing-key fingerprint.
///
/// Construction is single-flight per key: concurrent first callers wait on the
/// same connect. A failed connect leaves the slot empty so the next call retries.
pub struct SessionStore {
    connector: Arc<dyn SdkConnector>,
    settings: WalletSettings,
    sessions: DashMap<String, Arc<OnceCell<Arc<WalletSession>>>>,
}

impl SessionStore {
    pub fn new(connector: Arc<dyn SdkConnector>, settings: WalletSettings) -> Self {
        Self {
            connector,
            settings,
            sessions: DashMap::new(),
        }
    }

    pub async fn get_or_create(&self, signing_key: &SecretString) -> Result<Arc<WalletSession>> {
        let fingerprint = key_fingerprint(signing_key);
        // Clone the cell out so the map shard is not locked across the await
        let cell = self
            .sessions
            .entry(fingerprint.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let session = cell
            .get_or_try_init(|| async {
                info!("Connecting wallet session {}", fingerprint);
                let sdk = self
                    .connector
                    .connect(signing_key, &self.settings)
                    .await
                    .context("failed to initialize wallet client")?;
                let session = WalletSession {
                    fingerprint: fingerprint.clone(),
                    chain_id: sdk.chain_id(),
                    address: sdk.address(),
                    sdk,
                };
                info!(
                    "Wallet session {} ready: {:?} on chain {}",
                    session.fingerprint, session.address, session.chain_id
                );
                Ok::<_, anyhow::Error>(Arc::new(session))
            })
            .await?;

        debug!("Using wallet session {}", fingerprint);
        Ok(session.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    struct StaticWallet;

    #[async_trait]
    impl WalletSdk for StaticWallet {
        fn chain_id(&self) -> u64 {
            56
        }

        fn address(&self) -> Address {
            Address::repeat_byte(0x11)
        }

        async fn run_action(&self, _action: &str, _args: Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    /// Counts connects; fails the first `failures` of them.
    struct CountingConnector {
        calls: AtomicUsize,
        failures: usize,
    }

    impl CountingConnector {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures,
            })
        }
    }

    #[async_trait]
    impl SdkConnector for CountingConnector {
        async fn connect(
            &self,
            _signing_key: &SecretString,
            _settings: &WalletSettings,
        ) -> Result<Arc<dyn WalletSdk>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n < self.failures {
                return Err(anyhow!("rpc unreachable"));
            }
            Ok(Arc::new(StaticWallet))
        }
    }

    fn settings() -> WalletSettings {
        WalletSettings {
            rpc_url: Url::parse("http://localhost:8545").unwrap(),
            api_key: SecretString::new("api".into()),
            chain_id: 56,
        }
    }

    fn key(byte: char) -> SecretString {
        SecretString::new(format!("0x{}", byte.to_string().repeat(64)))
    }

    #[tokio::test]
    async fn same_key_reuses_the_session() {
        let connector = CountingConnector::new(0);
        let store = SessionStore::new(connector.clone(), settings());

        let a = store.get_or_create(&key('a')).await.unwrap();
        let b = store.get_or_create(&key('a')).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);

        let c = store.get_or_create(&key('b')).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_first_calls_connect_once() {
        let connector = CountingConnector::new(0);
        let store = Arc::new(SessionStore::new(connector.clone(), settings()));

        let k = key('c');
        let results = futures::future::join_all((0..8).map(|_| {
            let store = store.clone();
            let k = k.clone();
            async move { store.get_or_create(&k).await }
        }))
        .await;

        let first = results[0].as_ref().unwrap().clone();
        for r in &results {
            assert!(Arc::ptr_eq(&first, r.as_ref().unwrap()));
        }
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_connect_is_retried() {
        let connector = CountingConnector::new(1);
        let store = SessionStore::new(connector.clone(), settings());

        let err = store.get_or_create(&key('d')).await.unwrap_err();
        assert!(format!("{:#}", err).contains("rpc unreachable"));
        assert!(store.is_empty());

        let session = store.get_or_create(&key('d')).await.unwrap();
        assert_eq!(session.chain_id, 56);
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
    }
}
