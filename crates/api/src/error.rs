//! Renders [`GatewayError`] as the fixed wire shape spec §6/§7 define:
//! `{"errors":[{"id":<slug>,"message":<text>}]}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_core::GatewayError;
use serde_json::json;
use tracing::error;

/// Newtype so `gateway-core::GatewayError` (which this crate doesn't
/// own) can implement axum's `IntoResponse`.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if let GatewayError::UnexpectedError(ref cause) = err {
            error!(error = %cause, slug = err.slug(), "unexpected error serving request");
        }
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "errors": [{ "id": err.slug(), "message": err.public_message() }]
        }));
        (status, body).into_response()
    }
}
