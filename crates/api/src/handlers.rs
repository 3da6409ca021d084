//! One function per spec §6 route. Each handler: parses its input,
//! calls exactly one `gateway-core` entry point, and renders the
//! result — no validation or business logic lives here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use gateway_core::{
    balances, build_skeleton, registration, submit_transaction, validate, SkeletonRequest,
    SubmissionContext, SubmissionRequest,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /balance/{addr}` (spec §6).
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let address = validate::valid_address(&address)
        .ok_or(gateway_core::GatewayError::InvalidAddress)?;
    let result = balances(state.chain.as_ref(), state.ledger.as_ref(), address, false).await?;
    Ok(Json(json!({
        "confirmed_balance": format!("{:#x}", result.confirmed),
        "unconfirmed_balance": format!("{:#x}", result.effective),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SkeletonBody {
    from: Option<String>,
    to: Option<String>,
    value: Option<String>,
    nonce: Option<String>,
    gas: Option<String>,
    gas_price: Option<String>,
}

/// `POST /tx/skeleton` (spec §6, §4.5).
pub async fn post_tx_skeleton(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SkeletonBody>,
) -> Result<impl IntoResponse, ApiError> {
    let (from, to, value) = match (&body.from, &body.to, &body.value) {
        (Some(from), Some(to), Some(value)) => (from, to, value),
        _ => return Err(gateway_core::GatewayError::BadArguments.into()),
    };

    let req = SkeletonRequest {
        from,
        to,
        value,
        nonce: body.nonce.as_deref(),
        gas: body.gas.as_deref(),
        gas_price: body.gas_price.as_deref(),
    };
    let resp = build_skeleton(
        state.chain.as_ref(),
        state.cache.as_ref(),
        state.codec.as_ref(),
        req,
    )
    .await?;

    Ok(Json(json!({
        "tx_data": {
            "nonce": format!("{:#x}", resp.nonce),
            "from": format!("{:#x}", resp.from),
            "to": format!("{:#x}", resp.to),
            "value": format!("{:#x}", resp.value),
            "startGas": format!("{:#x}", resp.start_gas),
            "gasPrice": format!("{:#x}", resp.gas_price),
        },
        "tx": format!("0x{}", hex::encode(resp.tx)),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SendTransactionBody {
    tx: Option<String>,
    signature: Option<String>,
}

/// `POST /tx` (spec §6, §4.6). `sender_token_id` is whatever
/// [`crate::verify::RequestVerifier`] resolved for this request — it is
/// not itself re-verified here, matching the original's
/// `is_request_signed()`/anonymous-fallback split.
pub async fn post_tx(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SendTransactionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = body
        .tx
        .as_deref()
        .ok_or(gateway_core::GatewayError::BadArguments)?;
    let sender_token_id = state.verifier.verify(&headers).await;

    let ctx = SubmissionContext {
        chain: state.chain.clone(),
        cache: state.cache.clone(),
        ledger: state.ledger.clone(),
        codec: state.codec.clone(),
    };
    let req = SubmissionRequest {
        tx_hex: tx,
        signature_hex: body.signature.as_deref(),
    };
    let hash = submit_transaction(&ctx, req, sender_token_id).await?;

    Ok(Json(json!({ "tx_hash": format!("{:#x}", hash) })))
}

/// `GET /tx/{hash}` (spec §6). Mirrors the original's behavior of
/// always returning a `{"tx": ...}` body, with a 404 status (and
/// `tx: null`) when the node doesn't know the hash.
pub async fn get_tx(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let hash: alloy::primitives::B256 = hash
        .parse()
        .map_err(|_| gateway_core::GatewayError::InvalidTransaction)?;
    let tx = state
        .chain
        .get_transaction_by_hash(hash)
        .await
        .map_err(|e| gateway_core::GatewayError::UnexpectedError(anyhow::Error::new(e)))?;

    match tx {
        Some(tx) => Ok((StatusCode::OK, Json(json!({ "tx": tx.0 })))),
        None => Ok((StatusCode::NOT_FOUND, Json(json!({ "tx": null })))),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddressesBody {
    addresses: Option<Vec<String>>,
}

/// `POST /notifications/register` (spec §4.7, §6).
pub async fn post_notifications_register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AddressesBody>,
) -> Result<impl IntoResponse, ApiError> {
    let token_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(gateway_core::GatewayError::BadArguments)?;
    let addresses = body.addresses.unwrap_or_default();
    let addresses: Vec<&str> = addresses.iter().map(String::as_str).collect();
    registration::register_notifications(state.ledger.as_ref(), &token_id, &addresses).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /notifications/deregister` (spec §4.7, §6).
pub async fn post_notifications_deregister(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AddressesBody>,
) -> Result<impl IntoResponse, ApiError> {
    let token_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(gateway_core::GatewayError::BadArguments)?;
    let addresses = body.addresses.unwrap_or_default();
    let addresses: Vec<&str> = addresses.iter().map(String::as_str).collect();
    registration::deregister_notifications(state.ledger.as_ref(), &token_id, &addresses).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct PushRegistrationBody {
    registration_id: Option<String>,
}

/// `POST /pn/{service}/register` (spec §4.7, §6).
pub async fn post_pn_register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(service): Path<String>,
    Json(body): Json<PushRegistrationBody>,
) -> Result<impl IntoResponse, ApiError> {
    let token_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(gateway_core::GatewayError::BadArguments)?;
    let registration_id = body
        .registration_id
        .ok_or(gateway_core::GatewayError::BadArguments)?;
    registration::register_push(state.ledger.as_ref(), &service, &registration_id, &token_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /pn/{service}/deregister` (spec §4.7, §6).
pub async fn post_pn_deregister(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(service): Path<String>,
    Json(body): Json<PushRegistrationBody>,
) -> Result<impl IntoResponse, ApiError> {
    let token_id = state
        .verifier
        .verify(&headers)
        .await
        .ok_or(gateway_core::GatewayError::BadArguments)?;
    let registration_id = body
        .registration_id
        .ok_or(gateway_core::GatewayError::BadArguments)?;
    registration::deregister_push(state.ledger.as_ref(), &service, &registration_id, &token_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
