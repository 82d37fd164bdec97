//! Collateral services: upstream PCS access and the read-through cache.

pub mod caching;
pub mod pcs;

pub use caching::CachingCollateralService;
pub use pcs::PcsClient;

use async_trait::async_trait;
use pccs_core::{ApiVersion, EnclaveIdentityKind, IdentityDocument, UpdateType};
use pccs_metadata::MetadataError;
use thiserror::Error;

/// Collateral service errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// `body` is kept for logging and never shown to clients.
    #[error("upstream returned status {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("upstream has no such collateral: {0}")]
    NotFound(String),

    #[error("upstream response is missing the {0} header")]
    MissingHeader(&'static str),

    #[error("invalid upstream configuration: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(#[from] MetadataError),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

/// Result type for collateral services.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Source of certificate revocation lists.
#[async_trait]
pub trait CrlService: Send + Sync {
    /// Fetch the DER-encoded CRL published at an allow-listed `uri`.
    async fn get_crl(&self, uri: &str) -> ServiceResult<Vec<u8>>;
}

/// Source of enclave identity documents.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn get_enclave_identity(
        &self,
        kind: EnclaveIdentityKind,
        version: ApiVersion,
        update_type: UpdateType,
    ) -> ServiceResult<IdentityDocument>;
}
