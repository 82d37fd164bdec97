//! Cached CRL repository.

use crate::error::MetadataResult;
use crate::models::CrlRow;
use async_trait::async_trait;

/// Repository for CRLs fetched from the upstream.
#[async_trait]
pub trait CrlRepo: Send + Sync {
    /// Get the cached CRL for an upstream URI.
    async fn get_crl(&self, uri: &str) -> MetadataResult<Option<CrlRow>>;

    /// Insert or replace a cached CRL. `created_at` is kept on replace.
    async fn upsert_crl(&self, row: &CrlRow) -> MetadataResult<()>;
}
