//! The pending ledger (spec §3 "Pending Ledger Row", §4.7).
//!
//! A narrow [`Ledger`] trait isolates [`crate::balance`], [`crate::nonce`],
//! and [`crate::submit`] from the concrete store; [`PgLedger`] is the
//! production implementation over Postgres via `sqlx`.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::error::GatewayError;

/// One row of the pending-transaction ledger. `confirmed` is always
/// `None` for rows this crate writes — a separate monitor process (out
/// of scope, spec §1) is the only writer of `confirmed`.
#[derive(Debug, Clone)]
pub struct PendingRow {
    pub transaction_hash: B256,
    pub from_address: Address,
    pub to_address: Address,
    pub value: U256,
    pub estimated_gas_cost: U256,
    pub sender_token_id: Option<String>,
}

/// Persistence seam for the pending ledger and the two notification
/// registration tables (spec §4.7). Every method is a single
/// short-lived operation — no method holds a transaction open across an
/// `.await` boundary visible to callers (spec §5).
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Sum of `value + estimated_gas_cost` over unconfirmed rows sent
    /// from `address` (spec §4.3 step 2).
    async fn pending_out(&self, address: Address) -> Result<U256, GatewayError>;

    /// Sum of `value` over unconfirmed rows received by `address`
    /// (spec §4.3 step 3).
    async fn pending_in(&self, address: Address) -> Result<U256, GatewayError>;

    /// Inserts one ledger row (spec §4.6 step 8b). The primary key is
    /// `transaction_hash`; a duplicate insert is a caller error (spec §9
    /// open question on duplicate broadcast).
    async fn insert_transaction(&self, row: PendingRow) -> Result<(), GatewayError>;

    /// Looks up a ledger row by hash. Used only to decide whether a
    /// duplicate submission is "already known" (spec §9).
    async fn find_by_hash(&self, hash: B256) -> Result<Option<PendingRow>, GatewayError>;

    /// Upserts `(token_id, address)` pairs, ignoring conflicts on the
    /// pair (spec §4.7).
    async fn register_notifications(
        &self,
        token_id: &str,
        addresses: &[Address],
    ) -> Result<(), GatewayError>;

    /// Deletes rows matching `token_id` AND `address ∈ addresses`
    /// (spec §4.7).
    async fn deregister_notifications(
        &self,
        token_id: &str,
        addresses: &[Address],
    ) -> Result<(), GatewayError>;

    /// Upserts `(service, registration_id) -> token_id`, last-writer-wins
    /// (spec §3, §4.7).
    async fn register_push(
        &self,
        service: &str,
        registration_id: &str,
        token_id: &str,
    ) -> Result<(), GatewayError>;

    /// Deletes the row matching `(service, registration_id, token_id)`
    /// (spec §4.7).
    async fn deregister_push(
        &self,
        service: &str,
        registration_id: &str,
        token_id: &str,
    ) -> Result<(), GatewayError>;
}

/// Production [`Ledger`] backed by a Postgres connection pool.
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unexpected(context: &'static str, err: sqlx::Error) -> GatewayError {
    GatewayError::UnexpectedError(anyhow::Error::new(err).context(context))
}

#[async_trait]
impl Ledger for PgLedger {
    async fn pending_out(&self, address: Address) -> Result<U256, GatewayError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT value, estimated_gas_cost FROM transactions \
             WHERE confirmed IS NULL AND from_address = $1",
        )
        .bind(format!("{address:#x}"))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| unexpected("pending_out query", e))?;

        let mut total = U256::ZERO;
        for (value, gas_cost) in rows {
            let value = U256::from_str_radix(&value, 10).unwrap_or(U256::ZERO);
            let gas_cost = U256::from_str_radix(&gas_cost, 10).unwrap_or(U256::ZERO);
            total += value + gas_cost;
        }
        Ok(total)
    }

    async fn pending_in(&self, address: Address) -> Result<U256, GatewayError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT value FROM transactions WHERE confirmed IS NULL AND to_address = $1",
        )
        .bind(format!("{address:#x}"))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| unexpected("pending_in query", e))?;

        let mut total = U256::ZERO;
        for (value,) in rows {
            total += U256::from_str_radix(&value, 10).unwrap_or(U256::ZERO);
        }
        Ok(total)
    }

    async fn insert_transaction(&self, row: PendingRow) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "INSERT INTO transactions \
             (transaction_hash, from_address, to_address, value, estimated_gas_cost, sender_token_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(format!("{:#x}", row.transaction_hash))
        .bind(format!("{:#x}", row.from_address))
        .bind(format!("{:#x}", row.to_address))
        .bind(row.value.to_string())
        .bind(row.estimated_gas_cost.to_string())
        .bind(row.sender_token_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // A duplicate transaction_hash means this broadcast was a
            // retry of an already-recorded submission (spec §9 open
            // question on duplicate broadcast): the row already
            // reflects this transaction, so the insert is a no-op
            // success rather than a split-brain failure.
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                warn!(tx_hash = %row.transaction_hash, "duplicate broadcast, ledger row already present");
                Ok(())
            }
            Err(e) => Err(unexpected("insert_transaction", e)),
        }
    }

    async fn find_by_hash(&self, hash: B256) -> Result<Option<PendingRow>, GatewayError> {
        let row: Option<(String, String, String, String, Option<String>)> = sqlx::query_as(
            "SELECT from_address, to_address, value, estimated_gas_cost, sender_token_id \
             FROM transactions WHERE transaction_hash = $1",
        )
        .bind(format!("{hash:#x}"))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unexpected("find_by_hash", e))?;

        Ok(row.map(|(from, to, value, gas_cost, token_id)| PendingRow {
            transaction_hash: hash,
            from_address: from.parse().unwrap_or(Address::ZERO),
            to_address: to.parse().unwrap_or(Address::ZERO),
            value: U256::from_str_radix(&value, 10).unwrap_or(U256::ZERO),
            estimated_gas_cost: U256::from_str_radix(&gas_cost, 10).unwrap_or(U256::ZERO),
            sender_token_id: token_id,
        }))
    }

    async fn register_notifications(
        &self,
        token_id: &str,
        addresses: &[Address],
    ) -> Result<(), GatewayError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| unexpected("register_notifications begin", e))?;
        for address in addresses {
            sqlx::query(
                "INSERT INTO notification_registrations (token_id, eth_address) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(token_id)
            .bind(format!("{address:#x}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| unexpected("register_notifications insert", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| unexpected("register_notifications commit", e))?;
        Ok(())
    }

    async fn deregister_notifications(
        &self,
        token_id: &str,
        addresses: &[Address],
    ) -> Result<(), GatewayError> {
        let addresses: Vec<String> = addresses.iter().map(|a| format!("{a:#x}")).collect();
        sqlx::query(
            "DELETE FROM notification_registrations \
             WHERE token_id = $1 AND eth_address = ANY($2)",
        )
        .bind(token_id)
        .bind(&addresses)
        .execute(&self.pool)
        .await
        .map_err(|e| unexpected("deregister_notifications", e))?;
        Ok(())
    }

    async fn register_push(
        &self,
        service: &str,
        registration_id: &str,
        token_id: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO push_notification_registrations (service, registration_id, token_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (service, registration_id) DO UPDATE SET token_id = EXCLUDED.token_id",
        )
        .bind(service)
        .bind(registration_id)
        .bind(token_id)
        .execute(&self.pool)
        .await
        .map_err(|e| unexpected("register_push", e))?;
        Ok(())
    }

    async fn deregister_push(
        &self,
        service: &str,
        registration_id: &str,
        token_id: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "DELETE FROM push_notification_registrations \
             WHERE service = $1 AND registration_id = $2 AND token_id = $3",
        )
        .bind(service)
        .bind(registration_id)
        .bind(token_id)
        .execute(&self.pool)
        .await
        .map_err(|e| unexpected("deregister_push", e))?;
        Ok(())
    }
}
