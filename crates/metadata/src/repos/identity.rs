//! Cached enclave identity repository.

use crate::error::MetadataResult;
use crate::models::EnclaveIdentityRow;
use async_trait::async_trait;
use pccs_core::{ApiVersion, EnclaveIdentityKind, UpdateType};

/// Repository for enclave identity documents.
#[async_trait]
pub trait IdentityRepo: Send + Sync {
    /// Get a cached identity.
    async fn get_identity(
        &self,
        kind: EnclaveIdentityKind,
        version: ApiVersion,
        update_type: UpdateType,
    ) -> MetadataResult<Option<EnclaveIdentityRow>>;

    /// Insert or replace a cached identity.
    async fn upsert_identity(&self, row: &EnclaveIdentityRow) -> MetadataResult<()>;
}
