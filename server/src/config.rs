//! Configuration management for the ticketmarket server.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Payment intent registry configuration
    pub registry: RegistryConfig,
    /// Developer portal configuration (identity verification and the
    /// authoritative payment-status API)
    pub portal: PortalConfig,
    /// NFT mint service configuration
    pub minter: MinterConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Payment intent registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// How long an unconfirmed intent lives before garbage collection, in
    /// seconds (default: 30 minutes)
    pub intent_ttl: u64,
    /// How often the expiry sweep runs, in seconds
    pub sweep_interval: u64,
}

/// Developer portal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Portal base URL
    pub base_url: String,
    /// Application id registered with the portal
    pub app_id: String,
    /// API key for the transaction-status API. When absent, the server runs
    /// in test mode and trusts the wallet-supplied payment status.
    pub api_key: Option<String>,
    /// Action identifier proofs must be bound to
    pub verify_action: String,
    /// Request timeout for portal calls, in seconds
    pub timeout: u64,
}

/// Mint service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinterConfig {
    /// Mint service endpoint. When absent, fulfillment is disabled and
    /// confirmed purchases issue ledger tickets only.
    pub endpoint: Option<String>,
    /// Request timeout for mint calls, in seconds. Minting waits for block
    /// confirmation, so this is the longest external timeout.
    pub timeout: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            },
            registry: RegistryConfig {
                intent_ttl: env::var("INTENT_TTL_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
                sweep_interval: env::var("INTENT_SWEEP_INTERVAL_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
            portal: PortalConfig {
                base_url: env::var("PORTAL_BASE_URL")
                    .unwrap_or_else(|_| "https://developer.worldcoin.org".to_string()),
                app_id: env::var("WORLD_APP_ID").unwrap_or_else(|_| "test_app_id".to_string()),
                api_key: env::var("DEV_PORTAL_API_KEY").ok(),
                verify_action: env::var("VERIFY_ACTION")
                    .unwrap_or_else(|_| "purchase-ticket".to_string()),
                timeout: env::var("PORTAL_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            minter: MinterConfig {
                endpoint: env::var("MINT_ENDPOINT").ok(),
                timeout: env::var("MINT_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            },
        }
    }
}
