//! Configuration (spec §4.9): everything the gateway needs is read from
//! the environment once at startup, mirroring the teacher's
//! `load_config`/`get_env` pattern in `main.rs` rather than a TOML/profile
//! system — a stateless gateway has no deployment-specific overrides to
//! select between.

use std::net::SocketAddr;

use anyhow::{anyhow, Result};
use tracing::info;

use crate::codec::{DEFAULT_GASPRICE, DEFAULT_STARTGAS};

/// Environment variable names.
mod env {
    pub const CHAIN_RPC_URL: &str = "GATEWAY_CHAIN_RPC_URL";
    pub const CHAIN_ID: &str = "GATEWAY_CHAIN_ID";
    pub const DATABASE_URL: &str = "GATEWAY_DATABASE_URL";
    pub const REDIS_URL: &str = "GATEWAY_REDIS_URL";
    pub const LISTEN_ADDR: &str = "GATEWAY_LISTEN_ADDR";
    pub const DEFAULT_STARTGAS: &str = "GATEWAY_DEFAULT_STARTGAS";
    pub const DEFAULT_GASPRICE: &str = "GATEWAY_DEFAULT_GASPRICE";
}

/// Fully resolved gateway configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// JSON-RPC endpoint of the chain node `gateway-chain` talks to.
    pub chain_rpc_url: String,
    /// Chain id used for EIP-155 signing-preimage construction and
    /// signature recovery.
    pub chain_id: u64,
    /// Postgres connection string for the pending-transaction ledger.
    pub database_url: String,
    /// Redis connection string for the advisory nonce cache.
    pub redis_url: String,
    /// Address the HTTP surface binds to.
    pub listen_addr: SocketAddr,
    /// Default start gas for a skeleton when the caller omits one.
    pub default_startgas: u64,
    /// Default gas price (wei) for a skeleton when the caller omits one.
    pub default_gasprice: u64,
}

impl GatewayConfig {
    /// Loads configuration from the process environment, applying
    /// `.env` first if present (teacher's `dotenvy::dotenv().ok()` call
    /// in `main.rs`, repeated here so tests and the binary share one
    /// loading path).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let get_env = |name: &str| -> Result<String> {
            std::env::var(name).map_err(|_| anyhow!("Missing env var: {}", name))
        };
        let get_env_or = |name: &str, default: &str| -> String {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        let get_u64 = |name: &str, default: u64| -> Result<u64> {
            match std::env::var(name) {
                Ok(v) => v
                    .parse()
                    .map_err(|e| anyhow!("Invalid integer for {}: {}", name, e)),
                Err(_) => Ok(default),
            }
        };

        let listen_addr: SocketAddr = get_env_or(env::LISTEN_ADDR, "0.0.0.0:8080")
            .parse()
            .map_err(|e| anyhow!("Invalid {}: {}", env::LISTEN_ADDR, e))?;

        Ok(Self {
            chain_rpc_url: get_env(env::CHAIN_RPC_URL)?,
            chain_id: get_u64(env::CHAIN_ID, 1)?,
            database_url: get_env(env::DATABASE_URL)?,
            redis_url: get_env(env::REDIS_URL)?,
            listen_addr,
            default_startgas: get_u64(env::DEFAULT_STARTGAS, DEFAULT_STARTGAS)?,
            default_gasprice: get_u64(env::DEFAULT_GASPRICE, DEFAULT_GASPRICE)?,
        })
    }

    /// Logs the resolved configuration at startup, redacting nothing
    /// sensitive lives here (no private keys — the gateway never holds
    /// one, see DESIGN.md).
    pub fn log_config(&self) {
        info!(
            chain_rpc_url = %self.chain_rpc_url,
            chain_id = self.chain_id,
            listen_addr = %self.listen_addr,
            default_startgas = self.default_startgas,
            default_gasprice = self.default_gasprice,
            "resolved gateway configuration"
        );
    }
}
