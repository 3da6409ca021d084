//! The gateway's error taxonomy (spec §7).
//!
//! Every variant owns the wire slug the HTTP layer echoes verbatim in
//! `{"errors":[{"id":<slug>,"message":<text>}]}`, so `gateway-api` never
//! re-derives the mapping from scratch.

use thiserror::Error;

/// A failure anywhere in the transaction orchestration layer.
///
/// The pipeline fails fast on the first error (spec §7: "Local recovery:
/// none"); there is deliberately no variant that carries partial
/// progress for the caller to resume.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required field or empty list")]
    BadArguments,

    #[error("invalid address")]
    InvalidAddress,

    #[error("invalid from address")]
    InvalidFromAddress,

    #[error("invalid to address")]
    InvalidToAddress,

    #[error("invalid value")]
    InvalidValue,

    #[error("invalid nonce")]
    InvalidNonce(&'static str),

    #[error("invalid gas")]
    InvalidGas,

    #[error("invalid gas price")]
    InvalidGasPrice,

    #[error("invalid transaction")]
    InvalidTransaction,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("missing signature")]
    MissingSignature,

    #[error("insufficient funds")]
    InsufficientFunds,

    /// An upstream RPC or persistence failure after validation passed.
    /// The inner message is logged, never returned to the client — see
    /// `message()` below.
    #[error("unexpected error")]
    UnexpectedError(#[source] anyhow::Error),
}

impl GatewayError {
    /// The wire slug from spec §7.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::BadArguments => "bad_arguments",
            Self::InvalidAddress => "invalid_address",
            Self::InvalidFromAddress => "invalid_from_address",
            Self::InvalidToAddress => "invalid_to_address",
            Self::InvalidValue => "invalid_value",
            Self::InvalidNonce(_) => "invalid_nonce",
            Self::InvalidGas => "invalid_gas",
            Self::InvalidGasPrice => "invalid_gas_price",
            Self::InvalidTransaction => "invalid_transaction",
            Self::InvalidSignature => "invalid_signature",
            Self::MissingSignature => "missing_signature",
            Self::InsufficientFunds => "insufficient_funds",
            Self::UnexpectedError(_) => "unexpected_error",
        }
    }

    /// The HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnexpectedError(_) => 500,
            _ => 400,
        }
    }

    /// The message surfaced to the client. For `UnexpectedError` this is a
    /// fixed generic string — the underlying cause is logged by the
    /// caller, never serialized (spec §4.6 step 7, §7).
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidNonce(reason) => reason.to_string(),
            Self::UnexpectedError(_) => {
                "An error occurred communicating with the Ethereum network, try again later"
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}
