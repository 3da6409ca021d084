//! The gateway's HTTP surface (spec §6): thin axum handlers that parse
//! requests, call into `gateway-core`, and render the result. No
//! algorithmic content lives here — every decision is made by the
//! orchestration layer in `gateway-core`.
//!
//! Authentication token validation is an external collaborator (spec
//! §1) this crate does not implement; [`RequestVerifier`] is the seam
//! a real deployment plugs a token-service client into, with a
//! pass-through default that treats every request as anonymous.

mod error;
mod handlers;
mod state;
mod verify;

pub use error::ApiError;
pub use state::AppState;
pub use verify::{AnonymousVerifier, RequestVerifier};

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the full router: every path of spec §6 plus tracing and a
/// permissive CORS layer (wallet clients call this from arbitrary
/// origins), mirroring the teacher's `Router::new().merge(...).layer(...)`
/// composition.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/balance/:address", get(handlers::get_balance))
        .route("/tx/skeleton", post(handlers::post_tx_skeleton))
        .route("/tx", post(handlers::post_tx))
        .route("/tx/:hash", get(handlers::get_tx))
        .route(
            "/notifications/register",
            post(handlers::post_notifications_register),
        )
        .route(
            "/notifications/deregister",
            post(handlers::post_notifications_deregister),
        )
        .route("/pn/:service/register", post(handlers::post_pn_register))
        .route(
            "/pn/:service/deregister",
            post(handlers::post_pn_deregister),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
}
