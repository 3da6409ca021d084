use thiserror::Error;

/// Failure talking to the upstream Ethereum JSON-RPC node.
///
/// Deliberately opaque: the gateway's error taxonomy (§7 of the spec)
/// collapses any chain-client failure into a single `unexpected_error`
/// response, so callers only need to know that the call failed, not why.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(String),
    #[error("rpc call rejected: {0}")]
    Rpc(String),
}
