// src/config.rs

use std::env;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

/// Chain used when `CHAIN_ID` is not set (BNB Smart Chain).
pub const DEFAULT_CHAIN_ID: u64 = 56;

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";
pub const RPC_URL_VAR: &str = "RPC_URL";
pub const API_KEY_VAR: &str = "API_KEY";
pub const CHAIN_ID_VAR: &str = "CHAIN_ID";
pub const OPENROUTER_API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const OPENROUTER_BASE_URL_VAR: &str = "OPENROUTER_BASE_URL";

/// A single problem found while validating the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("PRIVATE_KEY must be a 0x-prefixed 32-byte hex string ({0})")]
    InvalidPrivateKey(&'static str),
    #[error("RPC_URL is not a valid http(s) URL: {0}")]
    InvalidRpcUrl(String),
    #[error("CHAIN_ID must be a positive integer, got '{0}'")]
    InvalidChainId(String),
    #[error("OPENROUTER_BASE_URL is not a valid http(s) URL: {0}")]
    InvalidOpenRouterUrl(String),
}

/// Every field error found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub errors: Vec<FieldError>,
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "invalid configuration: {}", lines.join("; "))
    }
}

// All configuration, validated once at startup from the environment (and .env file).
#[derive(Clone, Debug)]
pub struct Config {
    /// Signing key of the wallet, `0x` + 64 hex characters.
    pub private_key: SecretString,
    /// Chain JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Wallet SDK API key, forwarded to the RPC endpoint as a bearer token.
    pub api_key: SecretString,
    pub chain_id: u64,

    // OpenRouter credit purchases
    pub openrouter_api_key: Option<SecretString>,
    pub openrouter_base_url: Url,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source, collecting
    /// every field error instead of stopping at the first one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut errors = Vec::new();

        let private_key = match read(PRIVATE_KEY_VAR) {
            Some(key) => match validate_private_key(&key) {
                Ok(()) => Some(SecretString::new(key)),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => {
                errors.push(FieldError::Missing(PRIVATE_KEY_VAR));
                None
            }
        };

        let rpc_url = match read(RPC_URL_VAR) {
            Some(raw) => match parse_http_url(&raw) {
                Ok(url) => Some(url),
                Err(reason) => {
                    errors.push(FieldError::InvalidRpcUrl(reason));
                    None
                }
            },
            None => {
                errors.push(FieldError::Missing(RPC_URL_VAR));
                None
            }
        };

        let api_key = read(API_KEY_VAR).map(SecretString::new);
        if api_key.is_none() {
            errors.push(FieldError::Missing(API_KEY_VAR));
        }

        let chain_id = match read(CHAIN_ID_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(id) if id > 0 => id,
                _ => {
                    errors.push(FieldError::InvalidChainId(raw));
                    DEFAULT_CHAIN_ID
                }
            },
            None => DEFAULT_CHAIN_ID,
        };

        let openrouter_api_key = read(OPENROUTER_API_KEY_VAR).map(SecretString::new);

        let openrouter_base_url = match read(OPENROUTER_BASE_URL_VAR) {
            Some(raw) => match parse_http_url(&raw) {
                Ok(url) => Some(url),
                Err(reason) => {
                    errors.push(FieldError::InvalidOpenRouterUrl(reason));
                    None
                }
            },
            None => Url::parse(DEFAULT_OPENROUTER_BASE_URL).ok(),
        };

        match (private_key, rpc_url, api_key, openrouter_base_url) {
            (Some(private_key), Some(rpc_url), Some(api_key), Some(openrouter_base_url))
                if errors.is_empty() =>
            {
                Ok(Config {
                    private_key,
                    rpc_url,
                    api_key,
                    chain_id,
                    openrouter_api_key,
                    openrouter_base_url,
                })
            }
            _ => Err(ConfigError { errors }),
        }
    }

    /// Writes a human-readable validation summary to the diagnostic stream.
    /// Secrets are reported by fingerprint only.
    pub fn log_summary(&self) {
        info!("Configuration validated");
        info!("  {}: set (fingerprint {})", PRIVATE_KEY_VAR, key_fingerprint(&self.private_key));
        info!("  {}: {}", RPC_URL_VAR, redact_url(&self.rpc_url));
        info!("  {}: set", API_KEY_VAR);
        info!("  {}: {}", CHAIN_ID_VAR, self.chain_id);
        if self.openrouter_api_key.is_some() {
            info!(
                "  {}: set (credits endpoint {})",
                OPENROUTER_API_KEY_VAR, self.openrouter_base_url
            );
        } else {
            warn!(
                "  {}: not set, buy-openrouter-credits will be unavailable",
                OPENROUTER_API_KEY_VAR
            );
        }
    }
}

impl ConfigError {
    pub fn log_summary(&self) {
        error!("Configuration is invalid ({} problem(s)):", self.errors.len());
        for e in &self.errors {
            error!("  - {}", e);
        }
    }
}

fn validate_private_key(key: &str) -> Result<(), FieldError> {
    let hex_part = key
        .strip_prefix("0x")
        .ok_or(FieldError::InvalidPrivateKey("missing 0x prefix"))?;
    if hex_part.len() != 64 {
        return Err(FieldError::InvalidPrivateKey("expected 64 hex characters"));
    }
    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FieldError::InvalidPrivateKey("non-hex characters"));
    }
    Ok(())
}

fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("'{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("'{}': unsupported scheme '{}'", raw, other)),
    }
}

// RPC URLs often embed provider keys in the path; only show the host.
fn redact_url(url: &Url) -> String {
    format!("{}://{}/…", url.scheme(), url.host_str().unwrap_or("?"))
}

/// Short SHA-256 digest of a signing key. Safe to log and to use as a map key.
pub fn key_fingerprint(key: &SecretString) -> String {
    let digest = Sha256::digest(key.expose_secret().to_lowercase().as_bytes());
    hex::encode(&digest[..8])
}
