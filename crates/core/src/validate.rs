//! Syntactic validators (spec §4.1).
//!
//! These never talk to the chain, cache, or ledger — they only decide
//! whether a string is shaped like an address, an integer, or a
//! signature. Semantic checks (does this nonce clear the floor, is this
//! address solvent) live in [`crate::nonce`] and [`crate::balance`].

use alloy::primitives::{Address, U256};

/// Accepts a `0x`-prefixed, 20-byte hex-encoded address; rejects
/// anything else (wrong length, missing prefix, non-hex characters).
pub fn valid_address(s: &str) -> Option<Address> {
    if !s.starts_with("0x") && !s.starts_with("0X") {
        return None;
    }
    let hex_part = &s[2..];
    if hex_part.len() != 40 {
        return None;
    }
    s.parse::<Address>().ok()
}

/// Accepts either a decimal integer or a `0x`-prefixed hex string;
/// rejects negative lexical forms and values that don't fit 256 bits.
///
/// This is the "accept either form" half of spec §4.1's `parseInt`. Use
/// [`parse_positive_int`] in contexts (value, gas, gas price) that must
/// additionally reject a logical zero.
pub fn parse_int(s: &str) -> Option<U256> {
    let s = s.trim();
    if s.is_empty() || s.starts_with('-') {
        return None;
    }
    if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex_part.is_empty() {
            return None;
        }
        U256::from_str_radix(hex_part, 16).ok()
    } else {
        U256::from_str_radix(s, 10).ok()
    }
}

/// As [`parse_int`], but fails the caller when the result is zero —
/// spec §4.1: "fail the caller when the result is logically zero in
/// contexts requiring positive amounts".
pub fn parse_positive_int(s: &str) -> Option<U256> {
    parse_int(s).filter(|v| !v.is_zero())
}

/// Accepts a `0x`-prefixed, 65-byte hex-encoded ECDSA signature.
pub fn valid_signature(s: &str) -> bool {
    let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) else {
        return false;
    };
    hex_part.len() == 130 && hex::decode(hex_part).is_ok()
}
