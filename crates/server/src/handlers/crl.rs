//! CRL endpoint.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use pccs_core::ApiVersion;
use serde::Deserialize;

/// Query parameters of the CRL endpoint.
#[derive(Debug, Deserialize)]
pub struct CrlQuery {
    /// Percent-encoded URL of the CRL to fetch.
    pub uri: Option<String>,
}

/// GET /sgx/certification/{version}/crl?uri=...
pub async fn get_crl(
    State(state): State<AppState>,
    request_uri: Uri,
    Query(query): Query<CrlQuery>,
) -> ApiResult<Response> {
    ApiVersion::from_path(request_uri.path()).inspect_err(|e| {
        tracing::warn!(path = request_uri.path(), error = %e, "Unsupported API version in request");
    })?;

    let uri = query.uri.as_deref();
    let category = state.allowlist.validate(uri).inspect_err(|e| {
        tracing::error!(uri = ?uri, error = %e, "uri is not valid");
    })?;
    // validate() rejects a missing uri
    let uri = uri.unwrap_or_default();

    tracing::debug!(uri, category = ?category, "Fetching CRL");
    let crl = state.crl.get_crl(uri).await?;

    Ok(([(CONTENT_TYPE, "application/pkix-crl")], crl).into_response())
}
