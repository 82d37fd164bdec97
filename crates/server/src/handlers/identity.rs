//! Enclave identity endpoints.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use pccs_core::EnclaveIdentityKind;
use serde::Deserialize;

/// Query parameters of the identity endpoints.
#[derive(Debug, Deserialize)]
pub struct IdentityQuery {
    /// Freshness preference (`standard` or `early`, any case).
    pub update: Option<String>,
}

/// GET /sgx/certification/{version}/qe/identity
pub async fn get_qe_identity(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<IdentityQuery>,
) -> ApiResult<Response> {
    enclave_identity(&state, EnclaveIdentityKind::Qe, &uri, &query).await
}

/// GET /sgx/certification/{version}/qve/identity
pub async fn get_qve_identity(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<IdentityQuery>,
) -> ApiResult<Response> {
    enclave_identity(&state, EnclaveIdentityKind::Qve, &uri, &query).await
}

/// GET /sgx/certification/{version}/tdqe/identity
pub async fn get_tdqe_identity(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<IdentityQuery>,
) -> ApiResult<Response> {
    enclave_identity(&state, EnclaveIdentityKind::TdQe, &uri, &query).await
}

async fn enclave_identity(
    state: &AppState,
    kind: EnclaveIdentityKind,
    uri: &Uri,
    query: &IdentityQuery,
) -> ApiResult<Response> {
    let response = state
        .identity
        .get_identity(kind, uri.path(), query.update.as_deref())
        .await?;

    let header_name = HeaderName::from_bytes(response.header_name.as_bytes())
        .map_err(|e| ApiError::Internal(format!("invalid issuer chain header name: {e}")))?;
    let chain = HeaderValue::from_str(&response.issuer_chain)
        .map_err(|e| ApiError::Internal(format!("issuer chain is not a valid header value: {e}")))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header_name, chain),
        ],
        response.identity,
    )
        .into_response())
}
