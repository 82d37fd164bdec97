//! Read-through cache over an upstream collateral source.

use super::{CrlService, IdentityService, ServiceResult};
use async_trait::async_trait;
use pccs_core::{ApiVersion, EnclaveIdentityKind, IdentityDocument, UpdateType};
use pccs_metadata::MetadataStore;
use pccs_metadata::models::{CrlRow, EnclaveIdentityRow};
use std::sync::Arc;
use time::OffsetDateTime;

/// Serves collateral from the cache database, fetching from `upstream` on a miss.
///
/// A fetched copy that cannot be stored is still returned to the caller.
pub struct CachingCollateralService<U> {
    store: Arc<dyn MetadataStore>,
    upstream: U,
}

impl<U> CachingCollateralService<U> {
    pub fn new(store: Arc<dyn MetadataStore>, upstream: U) -> Self {
        Self { store, upstream }
    }
}

#[async_trait]
impl<U: CrlService> CrlService for CachingCollateralService<U> {
    async fn get_crl(&self, uri: &str) -> ServiceResult<Vec<u8>> {
        if let Some(row) = self.store.get_crl(uri).await? {
            tracing::debug!(uri, "CRL cache hit");
            return Ok(row.crl);
        }

        let crl = self.upstream.get_crl(uri).await?;
        if let Err(e) = self.store.upsert_crl(&CrlRow::new(uri, crl.clone())).await {
            tracing::warn!(uri, error = %e, "Failed to cache CRL");
        }
        Ok(crl)
    }
}

#[async_trait]
impl<U: IdentityService> IdentityService for CachingCollateralService<U> {
    async fn get_enclave_identity(
        &self,
        kind: EnclaveIdentityKind,
        version: ApiVersion,
        update_type: UpdateType,
    ) -> ServiceResult<IdentityDocument> {
        if let Some(row) = self.store.get_identity(kind, version, update_type).await? {
            tracing::debug!(kind = %kind, version = %version, "Enclave identity cache hit");
            return Ok(IdentityDocument {
                identity: row.identity,
                issuer_chain: row.issuer_chain,
            });
        }

        let document = self
            .upstream
            .get_enclave_identity(kind, version, update_type)
            .await?;

        let now = OffsetDateTime::now_utc();
        let row = EnclaveIdentityRow {
            identity_id: kind.id(),
            api_version: version.number().into(),
            update_type: update_type.as_str().to_string(),
            identity: document.identity.clone(),
            issuer_chain: document.issuer_chain.clone(),
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.store.upsert_identity(&row).await {
            tracing::warn!(kind = %kind, error = %e, "Failed to cache enclave identity");
        }
        Ok(document)
    }
}
