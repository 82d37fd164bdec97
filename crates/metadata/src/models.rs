//! Database row models.

use pccs_core::ApiVersion;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Recorded association between the cache and the upstream it was built from.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CacheBinding {
    pub api_version: i64,
    pub server_addr: String,
}

impl CacheBinding {
    pub fn new(api_version: ApiVersion, server_addr: impl Into<String>) -> Self {
        Self {
            api_version: api_version.number().into(),
            server_addr: server_addr.into(),
        }
    }
}

/// A cached CRL.
#[derive(Debug, Clone, FromRow)]
pub struct CrlRow {
    pub uri: String,
    pub crl: Vec<u8>,
    pub crl_size: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CrlRow {
    /// Build a fresh row for `crl` fetched from `uri`.
    pub fn new(uri: impl Into<String>, crl: Vec<u8>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            uri: uri.into(),
            crl_size: crl.len() as i64,
            crl,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A cached enclave identity document.
#[derive(Debug, Clone, FromRow)]
pub struct EnclaveIdentityRow {
    pub identity_id: i64,
    pub api_version: i64,
    pub update_type: String,
    pub identity: String,
    pub issuer_chain: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
