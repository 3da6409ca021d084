//! Request verification (spec §1: "authentication token validation" is
//! an external collaborator named only through its interface). This
//! module is that interface: a narrow trait a real deployment backs
//! with a token-service client, plus a pass-through default for
//! everything this specification doesn't otherwise require to be
//! authenticated.

use async_trait::async_trait;
use axum::http::HeaderMap;

/// Resolves the caller identity (spec glossary, "Token identity") from
/// request headers, or `None` for an anonymous caller.
#[async_trait]
pub trait RequestVerifier: Send + Sync {
    async fn verify(&self, headers: &HeaderMap) -> Option<String>;
}

/// Treats every request as anonymous. The original's
/// `RequestVerificationMixin` is a separate service this gateway does
/// not reimplement; this default lets the rest of the surface run
/// without it until a real verifier is wired in.
pub struct AnonymousVerifier;

#[async_trait]
impl RequestVerifier for AnonymousVerifier {
    async fn verify(&self, _headers: &HeaderMap) -> Option<String> {
        None
    }
}
