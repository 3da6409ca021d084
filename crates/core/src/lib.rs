//! Gateway core: the transaction orchestration layer.
//!
//! This crate contains the algorithmic heart of the wallet gateway —
//! everything that must reconcile the chain node, the nonce cache, and
//! the pending-transaction ledger to stay correct under concurrent
//! submissions from the same sender:
//!
//! - [`validate`]: address/integer/signature syntactic checks
//! - [`codec`]: a narrow façade around the RLP transaction codec
//! - [`balance`]: confirmed/effective balance computation
//! - [`nonce`]: nonce-floor computation and validation
//! - [`skeleton`]: unsigned transaction assembly
//! - [`submit`]: the end-to-end signed-transaction submission pipeline
//! - [`registration`]: notification registration upserts/deletes
//! - [`ledger`] / [`cache`]: the persistence seams the above depend on
//! - [`config`]: environment-driven configuration
//! - [`error`]: the `GatewayError` taxonomy shared by every component

pub mod balance;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod nonce;
pub mod registration;
pub mod skeleton;
pub mod submit;
pub mod validate;

pub use balance::{balances, Balances};
pub use cache::{NonceCache, RedisNonceCache};
pub use codec::{DecodedTransaction, LegacyRlpCodec, TxCodec, DEFAULT_GASPRICE, DEFAULT_STARTGAS};
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use ledger::{Ledger, PendingRow, PgLedger};
pub use nonce::{suggested_nonce, validate_nonce};
pub use skeleton::{build_skeleton, SkeletonRequest, SkeletonResponse};
pub use submit::{submit_transaction, SubmissionContext, SubmissionRequest};
