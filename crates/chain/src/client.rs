//! Provider management for the gateway's single HTTP JSON-RPC connection.
//!
//! Mirrors the shape of a typical Alloy-backed provider wrapper: one
//! struct owning the RPC URL, typed read methods that may be retried
//! transparently, and a broadcast method that never is (§5 of the spec).

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ChainError;

/// A transaction as returned by `eth_getTransactionByHash`, passed through
/// verbatim. The gateway does not interpret its fields — it only serves
/// it back to the client or reports it as absent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChainTransaction(pub serde_json::Value);

/// Façade over the four JSON-RPC operations the gateway needs.
///
/// `send_raw_transaction` MUST NOT be retried by implementations: a
/// duplicate broadcast at a different nonce could double-spend (§5).
/// The read operations MAY be retried transparently.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256, ChainError>;
    async fn get_transaction_count(&self, address: Address) -> Result<U256, ChainError>;
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ChainError>;
    async fn get_transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<ChainTransaction>, ChainError>;
}

/// Maximum number of attempts for an idempotent read RPC.
const READ_RETRY_ATTEMPTS: u32 = 3;

/// Production [`ChainClient`] backed by an `alloy` HTTP provider.
pub struct AlloyProvider {
    rpc_url: String,
}

impl AlloyProvider {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
        }
    }

    fn provider(&self) -> Result<impl Provider, ChainError> {
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Transport(format!("invalid rpc url: {e}")))?;
        Ok(ProviderBuilder::new().on_http(url))
    }

    /// Runs `f` against a fresh provider, retrying transport failures up
    /// to [`READ_RETRY_ATTEMPTS`] times. Used only for idempotent reads.
    async fn with_retry<T, F, Fut>(&self, op: &str, f: F) -> Result<T, ChainError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, ChainError>>,
    {
        let mut last_err = None;
        for attempt in 1..=READ_RETRY_ATTEMPTS {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(op, attempt, error = %e, "chain read failed, retrying");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.expect("loop runs at least once"))
    }
}

#[async_trait]
impl ChainClient for AlloyProvider {
    async fn get_balance(&self, address: Address) -> Result<U256, ChainError> {
        self.with_retry("get_balance", || async {
            let provider = self.provider()?;
            provider
                .get_balance(address)
                .await
                .map_err(|e| ChainError::Transport(e.to_string()))
        })
        .await
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256, ChainError> {
        self.with_retry("get_transaction_count", || async {
            let provider = self.provider()?;
            let count = provider
                .get_transaction_count(address)
                .await
                .map_err(|e| ChainError::Transport(e.to_string()))?;
            Ok(U256::from(count))
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ChainError> {
        // Not retried: see ChainClient's doc comment.
        let provider = self.provider()?;
        let pending = provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let hash = *pending.tx_hash();
        debug!(tx_hash = %hash, "broadcast accepted by node");
        Ok(hash)
    }

    async fn get_transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<ChainTransaction>, ChainError> {
        self.with_retry("get_transaction_by_hash", || async {
            let provider = self.provider()?;
            let tx = provider
                .get_transaction_by_hash(hash)
                .await
                .map_err(|e| ChainError::Transport(e.to_string()))?;
            Ok(tx.map(|t| {
                ChainTransaction(serde_json::to_value(t).unwrap_or(serde_json::Value::Null))
            }))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic fake covering this crate's own unit tests.
    #[derive(Default)]
    struct FakeChainClient {
        pub balance: U256,
        pub nonce: U256,
        pub broadcast_hash: Option<B256>,
    }

    #[async_trait]
    impl ChainClient for FakeChainClient {
        async fn get_balance(&self, _address: Address) -> Result<U256, ChainError> {
            Ok(self.balance)
        }

        async fn get_transaction_count(&self, _address: Address) -> Result<U256, ChainError> {
            Ok(self.nonce)
        }

        async fn send_raw_transaction(&self, _raw: Bytes) -> Result<B256, ChainError> {
            self.broadcast_hash
                .ok_or_else(|| ChainError::Rpc("no hash configured".into()))
        }

        async fn get_transaction_by_hash(
            &self,
            _hash: B256,
        ) -> Result<Option<ChainTransaction>, ChainError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn fake_client_reports_configured_balance() {
        let client = FakeChainClient {
            balance: U256::from(1000u64),
            ..Default::default()
        };
        let balance = client.get_balance(Address::ZERO).await.unwrap();
        assert_eq!(balance, U256::from(1000u64));
    }
}
