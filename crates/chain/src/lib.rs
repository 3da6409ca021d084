//! Ethereum JSON-RPC chain client.
//!
//! This crate provides:
//! - A narrow [`ChainClient`] trait covering the four RPC operations the
//!   gateway needs (balance, nonce, broadcast, transaction lookup)
//! - [`AlloyProvider`], the production implementation backed by an
//!   `alloy` HTTP provider
//! - An in-memory fake for use in `gateway-core` tests

mod client;
mod error;

pub use client::{AlloyProvider, ChainClient, ChainTransaction};
pub use error::ChainError;
