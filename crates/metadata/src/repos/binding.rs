//! Cache binding repository.

use crate::error::MetadataResult;
use crate::models::CacheBinding;
use async_trait::async_trait;

/// Repository for the `pcs_version` records that bind a cache to its upstream.
#[async_trait]
pub trait BindingRepo: Send + Sync {
    /// List every version record. A healthy cache has exactly one.
    async fn list_bindings(&self) -> MetadataResult<Vec<CacheBinding>>;

    /// Record a binding.
    async fn insert_binding(&self, binding: &CacheBinding) -> MetadataResult<()>;
}
