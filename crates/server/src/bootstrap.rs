//! Startup gate: nothing is served until the configured upstream is supported
//! and the cache database is compatible and migrated.

use pccs_core::ApiVersion;
use pccs_core::config::AppConfig;
use pccs_metadata::{
    CacheBinding, MetadataError, MigrationOrchestrator, MigrationReport, SqliteStore,
};
use thiserror::Error;

/// Why the gateway refused to start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("the PCS API version configured is not supported (should be v3 or v4): {0}")]
    UnsupportedVersion(#[source] pccs_core::Error),

    #[error("invalid upstream configuration: {0}")]
    Config(#[source] pccs_core::Error),

    #[error("cache database check failed: {0}")]
    Cache(#[source] MetadataError),
}

impl StartupError {
    /// Whether restarting without operator action could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Cache(e) => e.is_retriable(),
            Self::UnsupportedVersion(_) | Self::Config(_) => false,
        }
    }
}

/// What the gate established.
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub api_version: ApiVersion,
    pub server_addr: String,
    /// `None` when database initialization is disabled.
    pub migration: Option<MigrationReport>,
}

/// Runs the startup checks once, before the listener is bound.
pub struct StartupGate<'a> {
    config: &'a AppConfig,
    store: &'a SqliteStore,
}

impl<'a> StartupGate<'a> {
    pub fn new(config: &'a AppConfig, store: &'a SqliteStore) -> Self {
        Self { config, store }
    }

    /// Verify the configured API version, then bring the cache up to date.
    ///
    /// With `metadata.init_db = false` the cache is trusted as-is.
    pub async fn check_and_initialize(&self) -> Result<StartupReport, StartupError> {
        let server_addr = self.config.upstream.host().map_err(StartupError::Config)?;
        let api_version = self.config.upstream.api_version().map_err(|e| {
            tracing::error!(uri = %self.config.upstream.uri, error = %e, "Unsupported PCS API version");
            match e {
                pccs_core::Error::UnsupportedApiVersion(_) => StartupError::UnsupportedVersion(e),
                other => StartupError::Config(other),
            }
        })?;

        if !self.config.metadata.init_db {
            tracing::warn!("Cache database initialization disabled, skipping compatibility check");
            return Ok(StartupReport {
                api_version,
                server_addr,
                migration: None,
            });
        }

        let binding = CacheBinding::new(api_version, server_addr.clone());
        let mut orchestrator = MigrationOrchestrator::new(self.store, binding);
        let report = orchestrator.run().await.map_err(StartupError::Cache)?;

        tracing::info!(
            api_version = %api_version,
            server_addr = %server_addr,
            fresh = report.fresh,
            applied = report.applied.len(),
            "Cache database ready"
        );

        Ok(StartupReport {
            api_version,
            server_addr,
            migration: Some(report),
        })
    }
}
