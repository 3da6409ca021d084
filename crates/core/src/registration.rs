//! Notification registration (spec §4.7): validates the request shape
//! the original handlers enforced before touching the database, then
//! delegates to [`Ledger`]'s registration methods.
//!
//! Kept separate from [`Ledger`] itself so `gateway-api` has one place
//! to call regardless of which concrete store is wired up, and so the
//! "at least one address" / "every address is valid" checks aren't
//! duplicated across the register and deregister handlers.

use alloy::primitives::Address;

use crate::error::GatewayError;
use crate::ledger::Ledger;
use crate::validate::valid_address;

/// Parses and validates a batch of address strings, rejecting the whole
/// batch if it's empty or any entry fails to parse (spec §4.7, matching
/// the original's `'addresses' not in payload or len(...) == 0` check).
fn parse_addresses(addresses: &[&str]) -> Result<Vec<Address>, GatewayError> {
    if addresses.is_empty() {
        return Err(GatewayError::BadArguments);
    }
    addresses
        .iter()
        .map(|a| valid_address(a).ok_or(GatewayError::BadArguments))
        .collect()
}

/// `POST /notifications/register` (spec §4.7, §6).
pub async fn register_notifications(
    ledger: &dyn Ledger,
    token_id: &str,
    addresses: &[&str],
) -> Result<(), GatewayError> {
    let addresses = parse_addresses(addresses)?;
    ledger.register_notifications(token_id, &addresses).await
}

/// `POST /notifications/deregister` (spec §4.7, §6).
pub async fn deregister_notifications(
    ledger: &dyn Ledger,
    token_id: &str,
    addresses: &[&str],
) -> Result<(), GatewayError> {
    let addresses = parse_addresses(addresses)?;
    ledger.deregister_notifications(token_id, &addresses).await
}

/// `POST /pn/:service/register` (spec §4.7, §6). `registration_id` is
/// opaque to the gateway — the original leaves verifying it as a TODO,
/// and this crate carries that forward rather than inventing a scheme.
pub async fn register_push(
    ledger: &dyn Ledger,
    service: &str,
    registration_id: &str,
    token_id: &str,
) -> Result<(), GatewayError> {
    if registration_id.is_empty() {
        return Err(GatewayError::BadArguments);
    }
    ledger.register_push(service, registration_id, token_id).await
}

/// `POST /pn/:service/deregister` (spec §4.7, §6).
pub async fn deregister_push(
    ledger: &dyn Ledger,
    service: &str,
    registration_id: &str,
    token_id: &str,
) -> Result<(), GatewayError> {
    if registration_id.is_empty() {
        return Err(GatewayError::BadArguments);
    }
    ledger.deregister_push(service, registration_id, token_id).await
}
