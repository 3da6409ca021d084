//! The nonce cache (spec §3 "Nonce Cache Entry", §4.4).
//!
//! Advisory only: the [`crate::nonce`] oracle always reconciles against
//! the chain's view, so a stale or missing cache entry never produces
//! an incorrect result, only a possibly-redundant RPC round trip.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::GatewayError;

/// `nonce:<addr> -> integer`, the next nonce the gateway intends to
/// assign for `addr` (spec §3).
#[async_trait]
pub trait NonceCache: Send + Sync {
    async fn get(&self, address: Address) -> Result<Option<U256>, GatewayError>;
    async fn set(&self, address: Address, nonce: U256) -> Result<(), GatewayError>;
}

fn cache_key(address: Address) -> String {
    format!("nonce:{address:#x}")
}

/// Production [`NonceCache`] backed by Redis.
///
/// No TTL is set on the key — see DESIGN.md for why that is safe given
/// the chain-reconciliation step in [`crate::nonce::suggested_nonce`].
pub struct RedisNonceCache {
    conn: ConnectionManager,
}

impl RedisNonceCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl NonceCache for RedisNonceCache {
    async fn get(&self, address: Address) -> Result<Option<U256>, GatewayError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(cache_key(address))
            .await
            .map_err(|e| GatewayError::UnexpectedError(anyhow::Error::new(e).context("nonce cache get")))?;
        Ok(raw.and_then(|s| U256::from_str_radix(&s, 10).ok()))
    }

    async fn set(&self, address: Address, nonce: U256) -> Result<(), GatewayError> {
        let mut conn = self.conn.clone();
        conn.set(cache_key(address), nonce.to_string())
            .await
            .map_err(|e| GatewayError::UnexpectedError(anyhow::Error::new(e).context("nonce cache set")))?;
        Ok(())
    }
}
