//! Collateral cache database for the SGX collateral gateway.
//!
//! This crate provides:
//! - The SQLite store and its repositories (CRLs, enclave identities, cache binding)
//! - The compiled-in schema migrations
//! - [`MigrationOrchestrator`], which brings a cache to the current schema and
//!   refuses caches bound to a different upstream

pub mod error;
pub mod migration;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{Incompatibility, MetadataError, MetadataResult};
pub use migration::{
    Migration, MigrationEvent, MigrationOrchestrator, MigrationPhase, MigrationReport,
    OrchestratorState,
};
pub use models::CacheBinding;
pub use store::{MetadataStore, SqliteStore};

use pccs_core::config::MetadataConfig;

/// Open the cache database named by configuration.
///
/// The schema is left untouched; run a [`MigrationOrchestrator`] before serving.
pub async fn open(config: &MetadataConfig) -> MetadataResult<SqliteStore> {
    SqliteStore::new(&config.path).await
}
