//! Application state shared across handlers.

use crate::dispatch::IdentityDispatcher;
use crate::services::{CrlService, IdentityService};
use pccs_core::UrlAllowlist;
use pccs_core::config::AppConfig;
use pccs_metadata::MetadataStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Cache database.
    pub metadata: Arc<dyn MetadataStore>,
    /// Upstream URLs the CRL endpoint may fetch.
    pub allowlist: UrlAllowlist,
    /// CRL source.
    pub crl: Arc<dyn CrlService>,
    /// Enclave identity dispatch.
    pub identity: IdentityDispatcher,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        crl: Arc<dyn CrlService>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            allowlist: UrlAllowlist::default(),
            crl,
            identity: IdentityDispatcher::new(identity),
        }
    }
}
