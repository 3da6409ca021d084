//! Skeleton Builder (spec §4.5).
//!
//! Assembles an unsigned transaction from a partial request, filling
//! defaults. Does not consult the balance oracle and does not write any
//! state; idempotent at a fixed chain state (spec §4.5, testable
//! property 3).

use alloy::primitives::{Address, U256};
use gateway_chain::ChainClient;

use crate::cache::NonceCache;
use crate::codec::{DecodedTransaction, TxCodec, DEFAULT_GASPRICE, DEFAULT_STARTGAS};
use crate::error::GatewayError;
use crate::nonce::suggested_nonce;
use crate::validate::{parse_int, parse_positive_int, valid_address};

/// Raw skeleton request as received over the wire (spec §6 `/tx/skeleton`).
pub struct SkeletonRequest<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub value: &'a str,
    pub nonce: Option<&'a str>,
    pub gas: Option<&'a str>,
    pub gas_price: Option<&'a str>,
}

/// The echoed human-readable descriptor plus the encoded transaction.
pub struct SkeletonResponse {
    pub from: Address,
    pub to: Address,
    pub nonce: U256,
    pub value: U256,
    pub start_gas: U256,
    pub gas_price: U256,
    pub tx: alloy::primitives::Bytes,
}

/// Builds an unsigned transaction skeleton (spec §4.5).
pub async fn build_skeleton(
    chain: &dyn ChainClient,
    cache: &dyn NonceCache,
    codec: &dyn TxCodec,
    req: SkeletonRequest<'_>,
) -> Result<SkeletonResponse, GatewayError> {
    let from = valid_address(req.from).ok_or(GatewayError::InvalidFromAddress)?;
    let to = valid_address(req.to).ok_or(GatewayError::InvalidToAddress)?;
    let value = parse_positive_int(req.value).ok_or(GatewayError::InvalidValue)?;

    let nonce = match req.nonce {
        Some(n) => parse_int(n).ok_or(GatewayError::InvalidNonce("Invalid Nonce"))?,
        None => suggested_nonce(chain, cache, from).await?,
    };

    let gas = match req.gas {
        Some(g) => parse_int(g).ok_or(GatewayError::InvalidGas)?,
        None => U256::from(DEFAULT_STARTGAS),
    };

    let gas_price = match req.gas_price {
        Some(p) => parse_int(p).ok_or(GatewayError::InvalidGasPrice)?,
        None => U256::from(DEFAULT_GASPRICE),
    };

    let tx = DecodedTransaction::unsigned(nonce, gas_price, gas, to, value);
    let encoded = codec.encode(&tx);

    Ok(SkeletonResponse {
        from,
        to,
        nonce,
        value,
        start_gas: gas,
        gas_price,
        tx: encoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LegacyRlpCodec;
    use alloy::primitives::B256;
    use async_trait::async_trait;
    use gateway_chain::{ChainError, ChainTransaction};

    struct FakeChain {
        nonce: U256,
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn get_balance(&self, _address: Address) -> Result<U256, ChainError> {
            Ok(U256::ZERO)
        }
        async fn get_transaction_count(&self, _address: Address) -> Result<U256, ChainError> {
            Ok(self.nonce)
        }
        async fn send_raw_transaction(&self, _raw: alloy::primitives::Bytes) -> Result<B256, ChainError> {
            unimplemented!()
        }
        async fn get_transaction_by_hash(
            &self,
            _hash: B256,
        ) -> Result<Option<ChainTransaction>, ChainError> {
            Ok(None)
        }
    }

    struct EmptyCache;

    #[async_trait]
    impl NonceCache for EmptyCache {
        async fn get(&self, _address: Address) -> Result<Option<U256>, GatewayError> {
            Ok(None)
        }
        async fn set(&self, _address: Address, _nonce: U256) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    /// S1 — skeleton with defaults, from spec §8.
    #[tokio::test]
    async fn s1_skeleton_with_defaults() {
        let chain = FakeChain {
            nonce: U256::from(7u64),
        };
        let cache = EmptyCache;
        let codec = LegacyRlpCodec::new(1);

        let req = SkeletonRequest {
            from: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            to: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            value: "0x64",
            nonce: None,
            gas: None,
            gas_price: None,
        };

        let resp = build_skeleton(&chain, &cache, &codec, req).await.unwrap();
        assert_eq!(resp.nonce, U256::from(7u64));
        assert_eq!(resp.start_gas, U256::from(DEFAULT_STARTGAS));
        assert_eq!(resp.gas_price, U256::from(DEFAULT_GASPRICE));
    }

    /// Property 3 — identical inputs and chain state produce identical
    /// encodings.
    #[tokio::test]
    async fn skeleton_is_idempotent() {
        let chain = FakeChain {
            nonce: U256::from(3u64),
        };
        let cache = EmptyCache;
        let codec = LegacyRlpCodec::new(1);

        let make_req = || SkeletonRequest {
            from: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            to: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            value: "0x1",
            nonce: None,
            gas: None,
            gas_price: None,
        };

        let first = build_skeleton(&chain, &cache, &codec, make_req()).await.unwrap();
        let second = build_skeleton(&chain, &cache, &codec, make_req()).await.unwrap();
        assert_eq!(first.tx, second.tx);
    }
}
