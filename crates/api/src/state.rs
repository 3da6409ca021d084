use std::sync::Arc;

use gateway_chain::ChainClient;
use gateway_core::{GatewayConfig, Ledger, NonceCache, TxCodec};

use crate::verify::RequestVerifier;

/// Everything a handler needs, constructed once in `main` and shared
/// behind an `Arc` across every request (spec §5: no handler holds a
/// lock across an `.await`, so plain shared ownership is enough).
pub struct AppState {
    pub chain: Arc<dyn ChainClient>,
    pub ledger: Arc<dyn Ledger>,
    pub cache: Arc<dyn NonceCache>,
    pub codec: Arc<dyn TxCodec>,
    pub verifier: Arc<dyn RequestVerifier>,
    pub config: GatewayConfig,
}
