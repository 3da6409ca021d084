//! Nonce Oracle (spec §4.4).
//!
//! Reconciles the cached nonce hint against the chain's pending-inclusive
//! view. The cache is advisory and bounded only by this reconciliation —
//! there is deliberately no TTL (see DESIGN.md).

use alloy::primitives::{Address, U256};
use gateway_chain::ChainClient;
use tracing::debug;

use crate::cache::NonceCache;
use crate::error::GatewayError;

/// The nonce floor: the smallest nonce the gateway will accept for a new
/// submission from `address` (spec glossary, §4.4 steps 1–3).
async fn floor(
    chain: &dyn ChainClient,
    cache: &dyn NonceCache,
    address: Address,
) -> Result<U256, GatewayError> {
    let cached = cache.get(address).await?;
    let chain_nonce = chain
        .get_transaction_count(address)
        .await
        .map_err(|e| GatewayError::UnexpectedError(anyhow::Error::new(e)))?;

    let floor = match cached {
        Some(cached) if cached > chain_nonce => cached,
        _ => chain_nonce,
    };
    debug!(%address, ?cached, %chain_nonce, %floor, "computed nonce floor");
    Ok(floor)
}

/// `suggestedNonce(addr)` (spec §4.4, skeleton path): `max(cached, chainN)`.
pub async fn suggested_nonce(
    chain: &dyn ChainClient,
    cache: &dyn NonceCache,
    address: Address,
) -> Result<U256, GatewayError> {
    floor(chain, cache, address).await
}

/// `validateNonce(addr, submitted)` (spec §4.4, submission path).
///
/// Accepts any `submitted >= floor`; deliberately does not reject values
/// far in the future — chains legitimately accept gapped nonces and
/// backfill (spec §4.4 step 3).
pub async fn validate_nonce(
    chain: &dyn ChainClient,
    cache: &dyn NonceCache,
    address: Address,
    submitted: U256,
) -> Result<(), GatewayError> {
    let floor = floor(chain, cache, address).await?;
    if submitted < floor {
        return Err(GatewayError::InvalidNonce("Provided nonce is too low"));
    }
    Ok(())
}
