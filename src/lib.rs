// src/lib.rs

use std::sync::Arc;

pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod utils;

use blockchain::services::openrouter::OpenRouterClient;
use blockchain::{SdkConnector, WalletSettings};
use config::Config;
use mcp::session::SessionStore;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Wallet sessions, created on the first tool call
    pub sessions: Arc<SessionStore>,
    /// `None` when no OpenRouter API key is configured
    pub credits: Option<OpenRouterClient>,
}

impl AppState {
    pub fn new(config: Config, connector: Arc<dyn SdkConnector>) -> Self {
        let settings = WalletSettings {
            rpc_url: config.rpc_url.clone(),
            api_key: config.api_key.clone(),
            chain_id: config.chain_id,
        };
        let credits = config
            .openrouter_api_key
            .clone()
            .map(|key| OpenRouterClient::new(config.openrouter_base_url.clone(), key));
        Self {
            sessions: Arc::new(SessionStore::new(connector, settings)),
            credits,
            config: Arc::new(config),
        }
    }
}
