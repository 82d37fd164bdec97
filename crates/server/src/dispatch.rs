//! Enclave identity request dispatch.

use crate::error::ApiResult;
use crate::services::IdentityService;
use pccs_core::{ApiVersion, EnclaveIdentityKind, IssuerChain, UpdateType};
use std::sync::Arc;

/// A resolved enclave identity, ready to be written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResponse {
    pub version: ApiVersion,
    pub update_type: UpdateType,
    /// Name of the response header that carries `issuer_chain`.
    pub header_name: &'static str,
    pub issuer_chain: String,
    pub identity: String,
}

/// Validates identity requests and routes them to the identity service.
///
/// The version and update type are resolved before the service is called, so a
/// malformed request never reaches the upstream.
#[derive(Clone)]
pub struct IdentityDispatcher {
    service: Arc<dyn IdentityService>,
}

impl IdentityDispatcher {
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }

    pub async fn get_identity(
        &self,
        kind: EnclaveIdentityKind,
        path: &str,
        update: Option<&str>,
    ) -> ApiResult<IdentityResponse> {
        let version = ApiVersion::from_path(path).inspect_err(|e| {
            tracing::warn!(path, error = %e, "Unsupported API version in request");
        })?;
        let update_type = UpdateType::resolve(update).inspect_err(|e| {
            tracing::error!(update = ?update, error = %e, "Invalid update type");
        })?;

        let document = self
            .service
            .get_enclave_identity(kind, version, update_type)
            .await?;

        Ok(IdentityResponse {
            version,
            update_type,
            header_name: version.issuer_chain_header(IssuerChain::EnclaveIdentity),
            issuer_chain: document.issuer_chain,
            identity: document.identity,
        })
    }
}
