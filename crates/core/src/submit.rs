//! Submission Pipeline (spec §4.6): the end-to-end state machine for a
//! signed-transaction POST.
//!
//! A linear sequence of steps; each either advances or terminates with a
//! `GatewayError`. No step holds a lock across a suspension point (spec
//! §5) — every dependency is an `Arc<dyn Trait>` passed by reference.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use gateway_chain::ChainClient;
use tracing::{error, info};

use crate::balance::balances;
use crate::cache::NonceCache;
use crate::codec::TxCodec;
use crate::error::GatewayError;
use crate::ledger::{Ledger, PendingRow};
use crate::nonce::validate_nonce;
use crate::validate::valid_signature;

/// The components the submission pipeline (and only the submission
/// pipeline — the skeleton builder never touches the ledger, spec §2)
/// depends on.
pub struct SubmissionContext {
    pub chain: Arc<dyn ChainClient>,
    pub cache: Arc<dyn NonceCache>,
    pub ledger: Arc<dyn Ledger>,
    pub codec: Arc<dyn TxCodec>,
}

/// Raw submission payload as received over the wire (spec §6 `POST /tx`).
pub struct SubmissionRequest<'a> {
    pub tx_hex: &'a str,
    pub signature_hex: Option<&'a str>,
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    hex::decode(s).ok()
}

/// Runs the nine-step pipeline of spec §4.6 and returns the broadcast
/// transaction hash.
///
/// `sender_token_id` is the already-authenticated caller identity (step
/// 1; authentication itself is an external collaborator, spec §1).
pub async fn submit_transaction(
    ctx: &SubmissionContext,
    req: SubmissionRequest<'_>,
    sender_token_id: Option<String>,
) -> Result<B256, GatewayError> {
    // Step 2: decode.
    let tx_bytes = decode_hex(req.tx_hex).ok_or(GatewayError::InvalidTransaction)?;
    let mut tx = ctx.codec.decode(&tx_bytes)?;

    // Step 3: reconcile signature.
    if ctx.codec.is_signed(&tx) {
        if let Some(supplied) = req.signature_hex {
            let embedded = ctx
                .codec
                .signature_of(&tx)
                .map(|s| format!("0x{}", hex::encode(s)));
            let supplied_normalized = supplied.to_lowercase();
            if embedded.as_deref() != Some(supplied_normalized.as_str())
                && embedded.as_deref() != Some(supplied)
            {
                return Err(GatewayError::InvalidSignature);
            }
        }
    } else {
        let supplied = req.signature_hex.ok_or(GatewayError::MissingSignature)?;
        if !valid_signature(supplied) {
            return Err(GatewayError::InvalidSignature);
        }
        let bytes = decode_hex(supplied).ok_or(GatewayError::InvalidSignature)?;
        let signature: [u8; 65] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| GatewayError::InvalidSignature)?;
        tx = ctx.codec.attach_signature(tx, signature);
    }

    // Step 4: derive endpoints.
    let from = ctx.codec.sender_of(&tx)?;
    let to = tx.to;

    // Step 5: balance admissibility.
    let required = tx
        .value
        .checked_add(tx.start_gas.saturating_mul(tx.gas_price))
        .ok_or(GatewayError::InvalidValue)?;
    let balance = balances(ctx.chain.as_ref(), ctx.ledger.as_ref(), from, true).await?;
    info!(
        %from, %to, %required, confirmed = %balance.confirmed, effective = %balance.effective,
        "admissibility check"
    );
    if balance.effective < required {
        return Err(GatewayError::InsufficientFunds);
    }

    // Step 6: nonce admissibility.
    validate_nonce(ctx.chain.as_ref(), ctx.cache.as_ref(), from, tx.nonce).await?;

    // Step 7: broadcast. Never retried — see gateway_chain::ChainClient.
    let encoded = ctx.codec.encode(&tx);
    let hash = ctx
        .chain
        .send_raw_transaction(encoded)
        .await
        .map_err(|e| GatewayError::UnexpectedError(anyhow::Error::new(e)))?;

    // Step 8: commit side effects. The cache update happens first because
    // it is advisory; if the ledger insert below fails, the broadcast is
    // still on the network and the next chain-reconciled nonce read
    // stays correct (spec §4.6 ordering note).
    let next_nonce = tx
        .nonce
        .checked_add(U256::from(1u64))
        .ok_or(GatewayError::InvalidNonce("nonce overflow"))?;
    ctx.cache.set(from, next_nonce).await?;

    let row = PendingRow {
        transaction_hash: hash,
        from_address: from,
        to_address: to,
        value: tx.value,
        estimated_gas_cost: tx.start_gas.saturating_mul(tx.gas_price),
        sender_token_id,
    };
    if let Err(e) = ctx.ledger.insert_transaction(row).await {
        error!(
            tx_hash = %hash, %from, split_brain = true,
            error = %e,
            "broadcast succeeded but ledger insert failed; operator reconciliation required"
        );
    }

    // Step 9: respond.
    Ok(hash)
}

#[allow(dead_code)]
fn assert_send_sync<T: Send + Sync>() {}
#[allow(dead_code)]
fn _assert() {
    assert_send_sync::<SubmissionContext>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DecodedTransaction, LegacyRlpCodec};
    use async_trait::async_trait;
    use gateway_chain::{ChainError, ChainTransaction};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeChain {
        balance: U256,
        nonce: U256,
        hash: B256,
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn get_balance(&self, _address: Address) -> Result<U256, ChainError> {
            Ok(self.balance)
        }
        async fn get_transaction_count(&self, _address: Address) -> Result<U256, ChainError> {
            Ok(self.nonce)
        }
        async fn send_raw_transaction(&self, _raw: Bytes) -> Result<B256, ChainError> {
            Ok(self.hash)
        }
        async fn get_transaction_by_hash(
            &self,
            _hash: B256,
        ) -> Result<Option<ChainTransaction>, ChainError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct FakeCache {
        values: Mutex<HashMap<Address, U256>>,
    }

    #[async_trait]
    impl NonceCache for FakeCache {
        async fn get(&self, address: Address) -> Result<Option<U256>, GatewayError> {
            Ok(self.values.lock().unwrap().get(&address).copied())
        }
        async fn set(&self, address: Address, nonce: U256) -> Result<(), GatewayError> {
            self.values.lock().unwrap().insert(address, nonce);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeLedger {
        rows: Mutex<HashMap<B256, PendingRow>>,
    }

    #[async_trait]
    impl Ledger for FakeLedger {
        async fn pending_out(&self, _address: Address) -> Result<U256, GatewayError> {
            Ok(U256::ZERO)
        }
        async fn pending_in(&self, _address: Address) -> Result<U256, GatewayError> {
            Ok(U256::ZERO)
        }
        async fn insert_transaction(&self, row: PendingRow) -> Result<(), GatewayError> {
            self.rows.lock().unwrap().insert(row.transaction_hash, row);
            Ok(())
        }
        async fn find_by_hash(&self, hash: B256) -> Result<Option<PendingRow>, GatewayError> {
            Ok(self.rows.lock().unwrap().get(&hash).cloned())
        }
        async fn register_notifications(&self, _: &str, _: &[Address]) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn deregister_notifications(&self, _: &str, _: &[Address]) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn register_push(&self, _: &str, _: &str, _: &str) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn deregister_push(&self, _: &str, _: &str, _: &str) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn make_ctx(balance: u64, chain_nonce: u64, hash: B256) -> SubmissionContext {
        SubmissionContext {
            chain: Arc::new(FakeChain {
                balance: U256::from(balance),
                nonce: U256::from(chain_nonce),
                hash,
            }),
            cache: Arc::new(FakeCache::default()),
            ledger: Arc::new(FakeLedger::default()),
            codec: Arc::new(LegacyRlpCodec::new(1)),
        }
    }

    /// Signs `tx` with a throwaway local key and returns the 65-byte
    /// `r || s || recovery_id` signature, mirroring the construction
    /// `gateway-chain`'s signer would perform for a real wallet.
    async fn sign(codec: &LegacyRlpCodec, tx: &DecodedTransaction) -> ([u8; 65], Address) {
        use alloy::signers::local::PrivateKeySigner;
        use alloy::signers::Signer;

        let signer = PrivateKeySigner::random();
        let address = signer.address();
        let hash = codec.hash_for_signing(tx);
        let signature = signer.sign_hash(&hash).await.expect("sign");

        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
        out[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
        out[64] = signature.v().y_parity_byte();
        (out, address)
    }

    /// Testable property 4 / S5 — submission atomicity and the
    /// signature-attach path from spec §8.
    #[tokio::test]
    async fn s5_attach_signature_recovers_sender_and_commits_one_row() {
        let ctx = make_ctx(1_000_000_000_000_000_000, 0, B256::repeat_byte(0xee));
        let codec = LegacyRlpCodec::new(1);
        let tx = DecodedTransaction::unsigned(
            U256::ZERO,
            U256::from(1u64),
            U256::from(21_000u64),
            Address::repeat_byte(0xbb),
            U256::from(1u64),
        );
        let (signature, expected_sender) = sign(&codec, &tx).await;
        let unsigned_hex = format!("0x{}", hex::encode(codec.encode(&tx)));
        let signature_hex = format!("0x{}", hex::encode(signature));

        let req = SubmissionRequest {
            tx_hex: &unsigned_hex,
            signature_hex: Some(&signature_hex),
        };
        let hash = submit_transaction(&ctx, req, None).await.unwrap();
        assert_eq!(hash, B256::repeat_byte(0xee));

        let row = ctx.ledger.find_by_hash(hash).await.unwrap().unwrap();
        assert_eq!(row.from_address, expected_sender);
        let cached = ctx.cache.get(expected_sender).await.unwrap();
        assert_eq!(cached, Some(U256::from(1u64)));
    }

    #[tokio::test]
    async fn rejects_unsigned_transaction_without_signature_field() {
        let ctx = make_ctx(0, 0, B256::ZERO);
        let tx = DecodedTransaction::unsigned(
            U256::ZERO,
            U256::from(1u64),
            U256::from(21_000u64),
            Address::repeat_byte(0xbb),
            U256::from(1u64),
        );
        let encoded = ctx.codec.encode(&tx);
        let tx_hex = format!("0x{}", hex::encode(&encoded));

        let req = SubmissionRequest {
            tx_hex: &tx_hex,
            signature_hex: None,
        };
        let result = submit_transaction(&ctx, req, None).await;
        assert!(matches!(result, Err(GatewayError::MissingSignature)));
    }

    /// A signed transaction with a conflicting companion signature is
    /// rejected (testable property 5).
    #[tokio::test]
    async fn rejects_conflicting_companion_signature() {
        let ctx = make_ctx(0, 0, B256::ZERO);
        let codec = LegacyRlpCodec::new(1);
        let tx = DecodedTransaction::unsigned(
            U256::ZERO,
            U256::from(1u64),
            U256::from(21_000u64),
            Address::repeat_byte(0xbb),
            U256::from(1u64),
        );
        let (signature, _) = sign(&codec, &tx).await;
        let signed = codec.attach_signature(tx, signature);
        let signed_hex = format!("0x{}", hex::encode(codec.encode(&signed)));

        let other_signature = format!("0x{}", "11".repeat(65));
        let req = SubmissionRequest {
            tx_hex: &signed_hex,
            signature_hex: Some(&other_signature),
        };
        let result = submit_transaction(&ctx, req, None).await;
        assert!(matches!(result, Err(GatewayError::InvalidSignature)));
    }

    /// A signed transaction with a matching companion signature is
    /// accepted (testable property 5).
    #[tokio::test]
    async fn accepts_matching_companion_signature() {
        let ctx = make_ctx(1_000_000_000_000_000_000, 0, B256::repeat_byte(0xcc));
        let codec = LegacyRlpCodec::new(1);
        let tx = DecodedTransaction::unsigned(
            U256::ZERO,
            U256::from(1u64),
            U256::from(21_000u64),
            Address::repeat_byte(0xbb),
            U256::from(1u64),
        );
        let (signature, expected_sender) = sign(&codec, &tx).await;
        let signed = codec.attach_signature(tx, signature);
        let signed_hex = format!("0x{}", hex::encode(codec.encode(&signed)));
        let signature_hex = format!("0x{}", hex::encode(signature));

        let req = SubmissionRequest {
            tx_hex: &signed_hex,
            signature_hex: Some(&signature_hex),
        };
        let hash = submit_transaction(&ctx, req, None).await.unwrap();
        assert_eq!(hash, B256::repeat_byte(0xcc));

        let row = ctx.ledger.find_by_hash(hash).await.unwrap().unwrap();
        assert_eq!(row.from_address, expected_sender);
    }

    /// An already-signed transaction submitted with no companion signature
    /// field is accepted (testable property 5).
    #[tokio::test]
    async fn accepts_signed_transaction_without_companion_signature() {
        let ctx = make_ctx(1_000_000_000_000_000_000, 0, B256::repeat_byte(0xdd));
        let codec = LegacyRlpCodec::new(1);
        let tx = DecodedTransaction::unsigned(
            U256::ZERO,
            U256::from(1u64),
            U256::from(21_000u64),
            Address::repeat_byte(0xbb),
            U256::from(1u64),
        );
        let (signature, expected_sender) = sign(&codec, &tx).await;
        let signed = codec.attach_signature(tx, signature);
        let signed_hex = format!("0x{}", hex::encode(codec.encode(&signed)));

        let req = SubmissionRequest {
            tx_hex: &signed_hex,
            signature_hex: None,
        };
        let hash = submit_transaction(&ctx, req, None).await.unwrap();
        assert_eq!(hash, B256::repeat_byte(0xdd));

        let row = ctx.ledger.find_by_hash(hash).await.unwrap().unwrap();
        assert_eq!(row.from_address, expected_sender);
    }

    /// S2 — insufficient funds end to end through the pipeline.
    #[tokio::test]
    async fn s2_insufficient_funds_rejected() {
        // Balance 0x100, required 0x60 + 0x21000 * 0x01 = 0x21060 > balance.
        let ctx = make_ctx(0x100, 0, B256::ZERO);
        let codec = LegacyRlpCodec::new(1);
        let tx = DecodedTransaction::unsigned(
            U256::ZERO,
            U256::from(1u64),
            U256::from(0x21000u64),
            Address::repeat_byte(0xbb),
            U256::from(0x60u64),
        );
        let (signature, _) = sign(&codec, &tx).await;
        let signed = codec.attach_signature(tx, signature);
        let signed_hex = format!("0x{}", hex::encode(codec.encode(&signed)));

        let req = SubmissionRequest {
            tx_hex: &signed_hex,
            signature_hex: None,
        };
        let result = submit_transaction(&ctx, req, None).await;
        assert!(matches!(result, Err(GatewayError::InsufficientFunds)));
    }
}
