//! Codec Adapter (spec §4.2): a narrow façade around the legacy RLP
//! transaction format.
//!
//! The gateway never reasons about RLP fields directly outside this
//! module — every other component talks to [`DecodedTransaction`] and
//! the [`TxCodec`] trait, so a different wire codec (EIP-1559, a rollup's
//! custom envelope) only requires a new implementation of this trait.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};

use crate::error::GatewayError;

/// Default start gas for a skeleton transaction when the caller doesn't
/// supply one. Shared with the codec so skeleton and submission agree
/// on what "default" means.
pub const DEFAULT_STARTGAS: u64 = 21_000;

/// Default gas price (in wei) when the caller doesn't supply one.
pub const DEFAULT_GASPRICE: u64 = 20_000_000_000;

/// A decoded legacy transaction, signed or not.
///
/// `sender` is only ever populated by [`TxCodec::sender_of`] on a signed
/// transaction; it is never set by `decode` itself (spec §3: "`sender`
/// is derived from signature + transaction body; undefined when
/// unsigned").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub start_gas: U256,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub signature: Option<[u8; 65]>,
}

impl DecodedTransaction {
    pub fn unsigned(
        nonce: U256,
        gas_price: U256,
        start_gas: U256,
        to: Address,
        value: U256,
    ) -> Self {
        Self {
            nonce,
            gas_price,
            start_gas,
            to,
            value,
            data: Bytes::new(),
            signature: None,
        }
    }
}

/// The four-operation façade spec §4.2 requires, plus `decode`/`encode`.
///
/// Attaching a signature to an already-signed transaction overwrites it;
/// callers must not rely on the previous signature surviving (spec
/// §4.2).
pub trait TxCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedTransaction, GatewayError>;
    fn encode(&self, tx: &DecodedTransaction) -> Bytes;
    fn is_signed(&self, tx: &DecodedTransaction) -> bool {
        tx.signature.is_some()
    }
    /// Defined only when `is_signed(tx)`.
    fn signature_of(&self, tx: &DecodedTransaction) -> Option<[u8; 65]> {
        tx.signature
    }
    fn attach_signature(&self, tx: DecodedTransaction, signature: [u8; 65]) -> DecodedTransaction;
    /// Defined only when `is_signed(tx)`.
    fn sender_of(&self, tx: &DecodedTransaction) -> Result<Address, GatewayError>;
}

/// RLP encoding of an unsigned legacy transaction padded with the
/// EIP-155 replay-protection fields, used both as the signing preimage
/// and — once `v/r/s` are attached — reused as the basis for the signed
/// form below.
#[derive(RlpEncodable, RlpDecodable)]
struct UnsignedLegacyBody {
    nonce: U256,
    gas_price: U256,
    gas_limit: U256,
    to: Address,
    value: U256,
    data: Bytes,
}

/// The EIP-155 signing preimage: the unsigned body with the replay
/// protection trailer `(chain_id, 0, 0)` in place of `v, r, s`.
#[derive(RlpEncodable)]
struct Eip155SigningBody {
    nonce: U256,
    gas_price: U256,
    gas_limit: U256,
    to: Address,
    value: U256,
    data: Bytes,
    chain_id: U256,
    zero_r: U256,
    zero_s: U256,
}

#[derive(RlpEncodable, RlpDecodable)]
struct SignedLegacyBody {
    nonce: U256,
    gas_price: U256,
    gas_limit: U256,
    to: Address,
    value: U256,
    data: Bytes,
    v: U256,
    r: U256,
    s: U256,
}

/// [`TxCodec`] implementation for pre-typed ("legacy") Ethereum
/// transactions, RLP-encoded and EIP-155-signed.
pub struct LegacyRlpCodec {
    chain_id: u64,
}

impl LegacyRlpCodec {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    /// The EIP-155 signing preimage hash for `tx`, ignoring any signature
    /// already attached. Exposed at `pub(crate)` visibility so tests
    /// elsewhere in this crate can produce genuine signatures instead of
    /// synthetic ones.
    pub(crate) fn hash_for_signing(&self, tx: &DecodedTransaction) -> B256 {
        let body = UnsignedLegacyBody {
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.start_gas,
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
        };
        self.signing_hash(&body)
    }

    fn signing_hash(&self, body: &UnsignedLegacyBody) -> B256 {
        let signing_body = Eip155SigningBody {
            nonce: body.nonce,
            gas_price: body.gas_price,
            gas_limit: body.gas_limit,
            to: body.to,
            value: body.value,
            data: body.data.clone(),
            chain_id: U256::from(self.chain_id),
            zero_r: U256::ZERO,
            zero_s: U256::ZERO,
        };
        let mut buf = Vec::new();
        signing_body.encode(&mut buf);
        keccak256(buf)
    }
}

impl TxCodec for LegacyRlpCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedTransaction, GatewayError> {
        // Try the signed (9-field) form first; fall back to unsigned.
        if let Ok(body) = SignedLegacyBody::decode(&mut &bytes[..]) {
            let recovery_id = recovery_id_from_v(body.v, self.chain_id)
                .ok_or(GatewayError::InvalidTransaction)?;
            let mut signature = [0u8; 65];
            signature[..32].copy_from_slice(&body.r.to_be_bytes::<32>());
            signature[32..64].copy_from_slice(&body.s.to_be_bytes::<32>());
            signature[64] = recovery_id;
            return Ok(DecodedTransaction {
                nonce: body.nonce,
                gas_price: body.gas_price,
                start_gas: body.gas_limit,
                to: body.to,
                value: body.value,
                data: body.data,
                signature: Some(signature),
            });
        }
        let body =
            UnsignedLegacyBody::decode(&mut &bytes[..]).map_err(|_| GatewayError::InvalidTransaction)?;
        Ok(DecodedTransaction {
            nonce: body.nonce,
            gas_price: body.gas_price,
            start_gas: body.gas_limit,
            to: body.to,
            value: body.value,
            data: body.data,
            signature: None,
        })
    }

    fn encode(&self, tx: &DecodedTransaction) -> Bytes {
        let mut buf = Vec::new();
        match tx.signature {
            Some(sig) => {
                let r = U256::from_be_bytes::<32>(sig[..32].try_into().unwrap());
                let s = U256::from_be_bytes::<32>(sig[32..64].try_into().unwrap());
                let v = U256::from(v_from_recovery_id(sig[64], self.chain_id));
                SignedLegacyBody {
                    nonce: tx.nonce,
                    gas_price: tx.gas_price,
                    gas_limit: tx.start_gas,
                    to: tx.to,
                    value: tx.value,
                    data: tx.data.clone(),
                    v,
                    r,
                    s,
                }
                .encode(&mut buf);
            }
            None => {
                UnsignedLegacyBody {
                    nonce: tx.nonce,
                    gas_price: tx.gas_price,
                    gas_limit: tx.start_gas,
                    to: tx.to,
                    value: tx.value,
                    data: tx.data.clone(),
                }
                .encode(&mut buf);
            }
        }
        Bytes::from(buf)
    }

    fn attach_signature(&self, tx: DecodedTransaction, signature: [u8; 65]) -> DecodedTransaction {
        DecodedTransaction {
            signature: Some(signature),
            ..tx
        }
    }

    fn sender_of(&self, tx: &DecodedTransaction) -> Result<Address, GatewayError> {
        let signature = tx.signature.ok_or(GatewayError::MissingSignature)?;
        let body = UnsignedLegacyBody {
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.start_gas,
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
        };
        let hash = self.signing_hash(&body);
        recover_address(&hash, &signature).ok_or(GatewayError::InvalidSignature)
    }
}

/// Recovers the recovery id (0 or 1) encoded in an EIP-155 `v` value.
fn recovery_id_from_v(v: U256, chain_id: u64) -> Option<u8> {
    let v: u64 = v.try_into().ok()?;
    let base = chain_id.checked_mul(2)?.checked_add(35)?;
    if v == base {
        Some(0)
    } else if v == base + 1 {
        Some(1)
    } else {
        None
    }
}

fn v_from_recovery_id(recovery_id: u8, chain_id: u64) -> u64 {
    chain_id * 2 + 35 + recovery_id as u64
}

/// Recovers the signer address from a signing hash and a 65-byte
/// `r || s || recovery_id` signature.
fn recover_address(hash: &B256, signature: &[u8; 65]) -> Option<Address> {
    use alloy::primitives::PrimitiveSignature;

    let r = U256::from_be_bytes::<32>(signature[..32].try_into().ok()?);
    let s = U256::from_be_bytes::<32>(signature[32..64].try_into().ok()?);
    let recovery_id = signature[64] != 0;
    let sig = PrimitiveSignature::from_scalars_and_parity(r.into(), s.into(), recovery_id);
    sig.recover_address_from_prehash(hash).ok()
}
