//! Balance Oracle (spec §4.3).
//!
//! Computes confirmed and effective balance from chain state plus the
//! pending ledger. Arithmetic is exact 256-bit (`alloy::primitives::U256`)
//! throughout; the oracle does not lock ledger rows, relying on the
//! ledger's own read-consistent snapshot (spec §4.3, §5).

use alloy::primitives::{Address, U256};
use gateway_chain::ChainClient;
use tracing::debug;

use crate::error::GatewayError;
use crate::ledger::Ledger;

/// Confirmed chain balance plus the pending-adjusted effective balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    pub confirmed: U256,
    pub effective: U256,
}

/// Computes `(confirmed, effective)` for `address`.
///
/// `ignore_pending_in = true` is the admissibility check used before
/// accepting a new outgoing transaction: a sender must not be able to
/// spend funds only *promised* by an unconfirmed incoming transaction
/// (spec §4.3 rationale). `ignore_pending_in = false` is what is shown
/// to users on `/balance/:addr`.
pub async fn balances(
    chain: &dyn ChainClient,
    ledger: &dyn Ledger,
    address: Address,
    ignore_pending_in: bool,
) -> Result<Balances, GatewayError> {
    let confirmed = chain
        .get_balance(address)
        .await
        .map_err(|e| GatewayError::UnexpectedError(anyhow::Error::new(e)))?;

    let pending_out = ledger.pending_out(address).await?;
    let pending_in = if ignore_pending_in {
        U256::ZERO
    } else {
        ledger.pending_in(address).await?
    };

    let effective = confirmed
        .checked_add(pending_in)
        .and_then(|v| v.checked_sub(pending_out))
        .unwrap_or(U256::ZERO);

    debug!(
        %address,
        %confirmed,
        %pending_in,
        %pending_out,
        %effective,
        ignore_pending_in,
        "computed balances"
    );

    Ok(Balances {
        confirmed,
        effective,
    })
}
